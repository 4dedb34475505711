//! Backedge detection, Kahn longest-path layering, and dummy-node insertion.

use std::collections::{HashMap, VecDeque};

use super::{LayoutEdge, LayoutNode, NodeId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Depth-first traversal preferring nodes with no incoming edges as starts.
/// An edge whose destination is currently gray (on the DFS stack) is marked
/// a backedge, leaving a DAG over the rest.
pub fn mark_backedges(nodes: &[LayoutNode], edges: &mut [LayoutEdge]) {
    let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (ei, e) in edges.iter().enumerate() {
        if let Some(&u) = index.get(&e.from) {
            adj[u].push(ei);
        }
    }
    let mut has_incoming = vec![false; nodes.len()];
    for e in edges.iter() {
        if let Some(&v) = index.get(&e.to) {
            has_incoming[v] = true;
        }
    }
    let mut start_order: Vec<usize> = (0..nodes.len()).collect();
    start_order.sort_by_key(|&i| has_incoming[i]);

    let mut color = vec![Color::White; nodes.len()];
    for start in start_order {
        if color[start] == Color::White {
            dfs(start, &adj, &mut color, edges, &index);
        }
    }
}

fn dfs(u: usize, adj: &[Vec<usize>], color: &mut [Color], edges: &mut [LayoutEdge], index: &HashMap<NodeId, usize>) {
    color[u] = Color::Gray;
    for &ei in &adj[u] {
        let Some(&v) = index.get(&edges[ei].to) else { continue };
        match color[v] {
            Color::Gray => edges[ei].is_backedge = true,
            Color::White => dfs(v, adj, color, edges, index),
            Color::Black => {}
        }
    }
    color[u] = Color::Black;
}

/// Topological (Kahn) longest-path layering over non-backedge edges: every
/// node's layer is the maximum layer of its predecessors plus one.
pub fn assign_layers(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> HashMap<NodeId, i64> {
    let index: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
    let mut indegree = vec![0usize; nodes.len()];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for e in edges {
        if e.is_backedge {
            continue;
        }
        if let (Some(&u), Some(&v)) = (index.get(&e.from), index.get(&e.to)) {
            adj[u].push(v);
            indegree[v] += 1;
        }
    }

    let mut layer = vec![0i64; nodes.len()];
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    while let Some(u) = queue.pop_front() {
        let neighbors = adj[u].clone();
        for v in neighbors {
            if layer[v] < layer[u] + 1 {
                layer[v] = layer[u] + 1;
            }
            indegree[v] -= 1;
            if indegree[v] == 0 {
                queue.push_back(v);
            }
        }
    }

    nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), layer[i])).collect()
}

/// For every non-backedge edge spanning more than one layer, insert one dummy
/// node per intermediate layer and replace the edge with a chain through
/// them. Dummies inherit the file path of their source endpoint.
pub fn insert_dummies(
    mut nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    layers: HashMap<NodeId, i64>,
) -> (Vec<LayoutNode>, Vec<LayoutEdge>, HashMap<NodeId, i64>) {
    let file_of: HashMap<NodeId, Option<std::path::PathBuf>> =
        nodes.iter().map(|n| (n.id.clone(), n.file_path.clone())).collect();
    let mut new_layers = layers.clone();
    let mut new_edges = Vec::new();
    let mut dummy_counter = 0usize;
    let mut chain_counter = 0usize;

    for edge in edges {
        let chain_id = chain_counter;
        chain_counter += 1;

        if edge.is_backedge {
            new_edges.push(LayoutEdge { chain_id, ..edge });
            continue;
        }
        let (Some(&from_layer), Some(&to_layer)) = (layers.get(&edge.from), layers.get(&edge.to)) else {
            new_edges.push(LayoutEdge { chain_id, ..edge });
            continue;
        };
        let span = to_layer - from_layer;
        if span <= 1 {
            new_edges.push(LayoutEdge { chain_id, ..edge });
            continue;
        }

        let source_file = file_of.get(&edge.from).cloned().flatten();
        let mut prev = edge.from.clone();
        for l in (from_layer + 1)..to_layer {
            let dummy_id = format!("__dummy:{dummy_counter}");
            dummy_counter += 1;
            nodes.push(LayoutNode {
                id: dummy_id.clone(),
                file_path: source_file.clone(),
                label: String::new(),
                is_dummy: true,
                is_collapsed: false,
                folded_count: 0,
            });
            new_layers.insert(dummy_id.clone(), l);
            new_edges.push(LayoutEdge {
                from: prev,
                to: dummy_id.clone(),
                kind: edge.kind,
                call_line: edge.call_line,
                is_backedge: false,
                chain_id,
            });
            prev = dummy_id;
        }
        new_edges.push(LayoutEdge {
            from: prev,
            to: edge.to.clone(),
            kind: edge.kind,
            call_line: edge.call_line,
            is_backedge: false,
            chain_id,
        });
    }

    (nodes, new_edges, new_layers)
}
