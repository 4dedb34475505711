//! Pure forward/backward reachability intersection over an already-built
//! [`CallGraph`]. Never parses files or consults a resolver.

use std::collections::{HashSet, VecDeque};

use crate::model::{CallEdge, CallGraph, FunctionId};

/// The induced subgraph over nodes forward-reachable from some source and
/// backward-reachable from some target. Only ids present in `graph` count as
/// starts. An empty intersection yields an empty graph.
pub fn slice(graph: &CallGraph, sources: &[FunctionId], targets: &[FunctionId]) -> CallGraph {
    let forward = reachable(graph, sources, Direction::Forward);
    let backward = reachable(graph, targets, Direction::Backward);
    let kept: HashSet<&FunctionId> = forward.intersection(&backward).collect();

    let mut result = CallGraph::new();
    for id in &kept {
        if let Some(node) = graph.node(id) {
            result.insert_node(node.clone());
        }
    }
    for edge in graph.edges() {
        if kept.contains(&edge.caller) && kept.contains(&edge.callee) {
            result.add_edge(edge.clone());
        }
    }
    result
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn reachable(graph: &CallGraph, starts: &[FunctionId], direction: Direction) -> HashSet<FunctionId> {
    let mut visited: HashSet<FunctionId> = HashSet::new();
    let mut queue: VecDeque<FunctionId> = VecDeque::new();

    for start in starts {
        if graph.contains_node(start) && visited.insert(start.clone()) {
            queue.push_back(start.clone());
        }
    }

    while let Some(id) = queue.pop_front() {
        let next: Vec<&CallEdge> = match direction {
            Direction::Forward => graph.successors(&id).collect(),
            Direction::Backward => graph.predecessors(&id).collect(),
        };
        for edge in next {
            let neighbor = match direction {
                Direction::Forward => &edge.callee,
                Direction::Backward => &edge.caller,
            };
            if visited.insert(neighbor.clone()) {
                queue.push_back(neighbor.clone());
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, FunctionNode};
    use std::path::PathBuf;

    fn node(name: &str) -> FunctionNode {
        let id = FunctionId::new(PathBuf::from("a.ts"), name.to_string());
        FunctionNode {
            id,
            first_line: 1,
            last_line: Some(2),
            is_instrumented: false,
            is_external: false,
        }
    }

    fn edge(from: &str, to: &str) -> CallEdge {
        CallEdge {
            caller: FunctionId::new(PathBuf::from("a.ts"), from.to_string()),
            callee: FunctionId::new(PathBuf::from("a.ts"), to.to_string()),
            kind: EdgeKind::Direct,
            call_line: 1,
        }
    }

    fn build_chain() -> CallGraph {
        let mut g = CallGraph::new();
        for n in ["main", "helper", "transform", "unrelated"] {
            g.insert_node(node(n));
        }
        g.add_edge(edge("main", "helper"));
        g.add_edge(edge("helper", "transform"));
        g.add_edge(edge("main", "unrelated"));
        g
    }

    #[test]
    fn keeps_only_nodes_on_a_source_to_target_path() {
        let g = build_chain();
        let source = FunctionId::new(PathBuf::from("a.ts"), "main".to_string());
        let target = FunctionId::new(PathBuf::from("a.ts"), "transform".to_string());
        let sliced = slice(&g, &[source], &[target]);

        assert_eq!(sliced.node_count(), 3);
        assert!(sliced
            .nodes()
            .all(|n| n.qualified_name() != "unrelated"));
        assert_eq!(sliced.edges().len(), 2);
    }

    #[test]
    fn empty_intersection_yields_empty_graph() {
        let g = build_chain();
        let source = FunctionId::new(PathBuf::from("a.ts"), "transform".to_string());
        let target = FunctionId::new(PathBuf::from("a.ts"), "unrelated".to_string());
        let sliced = slice(&g, &[source], &[target]);
        assert_eq!(sliced.node_count(), 0);
        assert!(sliced.edges().is_empty());
    }
}
