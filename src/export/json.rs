//! Interchange JSON output for downstream renderers (§6).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{CallGraph, FunctionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: String,
    pub file_path: PathBuf,
    pub qualified_name: String,
    pub line: usize,
    pub is_instrumented: bool,
    pub is_source: bool,
    pub is_target: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_external: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub from: String,
    pub to: String,
    pub kind: crate::model::EdgeKind,
    pub call_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    pub edges: Vec<EdgeDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codeowners: Option<HashMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

fn node_key(id: &FunctionId) -> String {
    format!("{}::{}", id.file_path.display(), id.qualified_name)
}

pub fn build_document(
    graph: &CallGraph,
    repo_root: &Path,
    sources: &std::collections::HashSet<FunctionId>,
    targets: &std::collections::HashSet<FunctionId>,
    codeowners: Option<HashMap<String, Vec<String>>>,
    editor: Option<String>,
) -> GraphDocument {
    let mut nodes: Vec<NodeDocument> = graph
        .nodes()
        .map(|n| NodeDocument {
            id: node_key(&n.id),
            file_path: n.file_path().strip_prefix(repo_root).unwrap_or(n.file_path()).to_path_buf(),
            qualified_name: n.qualified_name().to_string(),
            line: n.first_line,
            is_instrumented: n.is_instrumented,
            is_source: sources.contains(&n.id),
            is_target: targets.contains(&n.id),
            description: None,
            signature: None,
            source_snippet: None,
            is_external: n.is_external,
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut edges: Vec<EdgeDocument> = graph
        .edges()
        .iter()
        .map(|e| EdgeDocument {
            from: node_key(&e.caller),
            to: node_key(&e.callee),
            kind: e.kind,
            call_line: e.call_line,
        })
        .collect();
    edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

    GraphDocument {
        nodes,
        edges,
        codeowners,
        repo_root: Some(repo_root.display().to_string()),
        editor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CallEdge, EdgeKind, FunctionNode};

    #[test]
    fn builds_document_with_role_flags() {
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

        let mut sources = std::collections::HashSet::new();
        sources.insert(a);
        let doc = build_document(&graph, Path::new("/repo"), &sources, &std::collections::HashSet::new(), None, None);
        assert_eq!(doc.nodes.len(), 2);
        assert!(doc.nodes.iter().find(|n| n.qualified_name == "main").unwrap().is_source);
        assert_eq!(doc.edges.len(), 1);
    }
}
