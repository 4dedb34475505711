//! Collapse preprocessing and cluster bounding-box computation.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::{Direction, LayoutEdge, LayoutNode, NodeId};
use crate::model::CallGraph;

const CLUSTER_PADDING: f64 = 16.0;
const HEADER_PADDING: f64 = 32.0;

fn node_key(id: &crate::model::FunctionId) -> NodeId {
    format!("{}::{}", id.file_path.display(), id.qualified_name)
}

fn collapsed_key(path: &std::path::Path) -> NodeId {
    format!("__collapsed:{}", path.display())
}

/// Fold every node of a collapsed file into one synthetic node, remapping
/// incident edges and dropping resulting self-loops and exact duplicates.
pub fn collapse(graph: &CallGraph, collapsed: &[PathBuf]) -> (Vec<LayoutNode>, Vec<LayoutEdge>) {
    let collapsed_set: HashSet<&PathBuf> = collapsed.iter().collect();

    let mut nodes = Vec::new();
    let mut remap: HashMap<NodeId, NodeId> = HashMap::new();
    let mut folded_count: HashMap<PathBuf, usize> = HashMap::new();

    for n in graph.nodes() {
        let key = node_key(&n.id);
        if collapsed_set.contains(&n.id.file_path) {
            let target = collapsed_key(&n.id.file_path);
            remap.insert(key, target.clone());
            *folded_count.entry(n.id.file_path.clone()).or_insert(0) += 1;
        } else {
            remap.insert(key.clone(), key);
            nodes.push(LayoutNode {
                id: node_key(&n.id),
                file_path: Some(n.id.file_path.clone()),
                label: format!("{}\n:{}", n.qualified_name(), n.first_line),
                is_dummy: false,
                is_collapsed: false,
                folded_count: 0,
            });
        }
    }

    for fp in collapsed {
        if let Some(&count) = folded_count.get(fp) {
            nodes.push(LayoutNode {
                id: collapsed_key(fp),
                file_path: Some(fp.clone()),
                label: fp.display().to_string(),
                is_dummy: false,
                is_collapsed: true,
                folded_count: count,
            });
        }
    }

    let mut seen_edges = HashSet::new();
    let mut edges = Vec::new();
    for e in graph.edges() {
        let from = remap.get(&node_key(&e.caller)).cloned().unwrap_or_else(|| node_key(&e.caller));
        let to = remap.get(&node_key(&e.callee)).cloned().unwrap_or_else(|| node_key(&e.callee));
        if from == to {
            continue;
        }
        let dedup_key = (from.clone(), to.clone(), e.kind);
        if !seen_edges.insert(dedup_key) {
            continue;
        }
        edges.push(LayoutEdge {
            from,
            to,
            kind: e.kind,
            call_line: e.call_line,
            is_backedge: false,
            chain_id: 0,
        });
    }

    (nodes, edges)
}

pub fn file_index(nodes: &[LayoutNode]) -> HashMap<NodeId, Option<PathBuf>> {
    nodes.iter().map(|n| (n.id.clone(), n.file_path.clone())).collect()
}

/// For each non-collapsed file, the padded axis-aligned bounding box of its
/// laid-out nodes. The header side gets extra padding for the filename label.
pub fn cluster_rectangles(
    nodes: &[LayoutNode],
    positions: &HashMap<NodeId, (f64, f64, f64, f64)>,
    cluster_order: &[PathBuf],
    direction: Direction,
) -> Vec<super::ClusterBox> {
    let mut bounds: HashMap<PathBuf, (f64, f64, f64, f64)> = HashMap::new();

    for n in nodes {
        if n.is_dummy || n.is_collapsed {
            continue;
        }
        let Some(fp) = &n.file_path else { continue };
        let Some(&(x, y, w, h)) = positions.get(&n.id) else { continue };
        let entry = bounds.entry(fp.clone()).or_insert((x, y, x + w, y + h));
        entry.0 = entry.0.min(x);
        entry.1 = entry.1.min(y);
        entry.2 = entry.2.max(x + w);
        entry.3 = entry.3.max(y + h);
    }

    cluster_order
        .iter()
        .filter_map(|fp| bounds.get(fp).map(|&(x0, y0, x1, y1)| {
            let (header_top, header_left) = match direction {
                Direction::TopToBottom => (HEADER_PADDING, CLUSTER_PADDING),
                Direction::LeftToRight => (CLUSTER_PADDING, HEADER_PADDING),
            };
            super::ClusterBox {
                file_path: fp.clone(),
                x: x0 - header_left,
                y: y0 - header_top,
                width: (x1 - x0) + header_left + CLUSTER_PADDING,
                height: (y1 - y0) + header_top + CLUSTER_PADDING,
            }
        }))
        .collect()
}
