//! Graphviz text output: a digraph named `callpath`, one cluster per source
//! file, nodes filled by role, edges styled by kind.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use crate::model::{CallGraph, EdgeKind, FunctionId, FunctionNode};

pub struct RenderOptions<'a> {
    pub repo_root: &'a Path,
    pub sources: &'a HashSet<FunctionId>,
    pub targets: &'a HashSet<FunctionId>,
}

pub fn render(graph: &CallGraph, opts: &RenderOptions) -> String {
    let mut by_file: HashMap<&Path, Vec<_>> = HashMap::new();
    let mut externals = Vec::new();
    for node in graph.nodes() {
        if node.is_external {
            externals.push(node);
        } else {
            by_file.entry(node.file_path()).or_default().push(node);
        }
    }

    let mut files: Vec<&Path> = by_file.keys().copied().collect();
    files.sort();

    let mut out = String::new();
    writeln!(out, "digraph callpath {{").unwrap();
    writeln!(out, "  rankdir=TB;").unwrap();

    for (i, file) in files.iter().enumerate() {
        let rel = file.strip_prefix(opts.repo_root).unwrap_or(file);
        writeln!(out, "  subgraph cluster_{i} {{").unwrap();
        writeln!(out, "    label={:?};", rel.display().to_string()).unwrap();
        let mut nodes = by_file[file].clone();
        nodes.sort_by_key(|n| n.qualified_name().to_string());
        for node in nodes {
            let fill = role_fill(node, opts);
            writeln!(
                out,
                "    {:?} [label={:?}, style=filled, fillcolor={:?}];",
                node_id(&node.id),
                format!("{}\\n:{}", node.qualified_name(), node.first_line),
                fill
            )
            .unwrap();
        }
        writeln!(out, "  }}").unwrap();
    }

    for node in &externals {
        writeln!(
            out,
            "  {:?} [label={:?}, shape=ellipse, style=filled, fillcolor=\"#e0e0e0\"];",
            node_id(&node.id),
            node.qualified_name()
        )
        .unwrap();
    }

    let mut edges: Vec<_> = graph.edges().iter().collect();
    edges.sort_by(|a, b| (&a.caller, &a.callee).cmp(&(&b.caller, &b.callee)));
    for edge in edges {
        let (style, label) = edge_style(edge.kind);
        write!(out, "  {:?} -> {:?} [{style}", node_id(&edge.caller), node_id(&edge.callee)).unwrap();
        if let Some(label) = label {
            write!(out, ", label={label:?}").unwrap();
        }
        writeln!(out, "];").unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

fn node_id(id: &FunctionId) -> String {
    format!("{}::{}", id.file_path.display(), id.qualified_name)
}

fn role_fill(node: &FunctionNode, opts: &RenderOptions) -> &'static str {
    if opts.sources.contains(&node.id) {
        "#bde0fe"
    } else if opts.targets.contains(&node.id) {
        "#ffc8dd"
    } else if node.is_instrumented {
        "#ffd6a5"
    } else {
        "#ffffff"
    }
}

fn edge_style(kind: EdgeKind) -> (&'static str, Option<&'static str>) {
    match kind {
        EdgeKind::Direct => ("style=solid", None),
        EdgeKind::StaticMethod => ("style=solid, color=\"#457b9d\"", None),
        EdgeKind::DiDefault => ("style=dashed", Some("DI")),
        EdgeKind::InstrumentWrapper => ("style=dotted", None),
        EdgeKind::InstanceMethod => ("style=solid, color=\"#2a9d8f\"", None),
        EdgeKind::ReExport => ("style=dotted", Some("re-export")),
        EdgeKind::External => ("style=solid, color=\"#888888\"", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallEdge, FunctionNode};
    use std::path::PathBuf;

    #[test]
    fn renders_a_minimal_digraph() {
        let mut graph = CallGraph::new();
        let a = FunctionId::new(PathBuf::from("/repo/a.ts"), "main");
        let b = FunctionId::new(PathBuf::from("/repo/a.ts"), "helper");
        graph.insert_node(FunctionNode {
            id: a.clone(),
            first_line: 1,
            last_line: Some(2),
            is_instrumented: false,
            is_external: false,
        });
        graph.insert_node(FunctionNode {
            id: b.clone(),
            first_line: 3,
            last_line: Some(4),
            is_instrumented: false,
            is_external: false,
        });
        graph.add_edge(CallEdge {
            caller: a.clone(),
            callee: b.clone(),
            kind: EdgeKind::Direct,
            call_line: 1,
        });

        let mut sources = HashSet::new();
        sources.insert(a);
        let opts = RenderOptions {
            repo_root: Path::new("/repo"),
            sources: &sources,
            targets: &HashSet::new(),
        };
        let dot = render(&graph, &opts);
        assert!(dot.starts_with("digraph callpath {"));
        assert!(dot.contains("cluster_0"));
        assert!(dot.contains("main"));
        assert!(dot.contains("helper"));
    }

    #[test]
    fn instrumented_node_gets_its_own_fill_distinct_from_default_and_roles() {
        let id = FunctionId::new(PathBuf::from("/repo/a.ts"), "wrapped");
        let node = FunctionNode {
            id: id.clone(),
            first_line: 1,
            last_line: Some(2),
            is_instrumented: true,
            is_external: false,
        };
        let opts = RenderOptions {
            repo_root: Path::new("/repo"),
            sources: &HashSet::new(),
            targets: &HashSet::new(),
        };
        let fill = role_fill(&node, &opts);
        assert_eq!(fill, "#ffd6a5");
        assert_ne!(fill, "#ffffff");
    }
}
