//! Within-layer ordering via barycenter sweeps, and cluster-order
//! derivation/retention across layout mutations.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::{LayoutEdge, LayoutNode, NodeId};

pub fn order_layers(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    layers: &HashMap<NodeId, i64>,
    previous_file_order: Option<&[PathBuf]>,
) -> Vec<Vec<NodeId>> {
    let max_layer = layers.values().copied().max().unwrap_or(0);
    let mut by_layer: Vec<Vec<NodeId>> = vec![Vec::new(); (max_layer + 1) as usize];
    for n in nodes {
        if let Some(&l) = layers.get(&n.id) {
            by_layer[l as usize].push(n.id.clone());
        }
    }

    let file_of: HashMap<NodeId, Option<PathBuf>> =
        nodes.iter().map(|n| (n.id.clone(), n.file_path.clone())).collect();
    let file_rank: HashMap<PathBuf, usize> = previous_file_order
        .map(|order| order.iter().cloned().enumerate().map(|(i, p)| (p, i)).collect())
        .unwrap_or_default();

    for layer in &mut by_layer {
        layer.sort_by(|a, b| {
            let fa = file_of.get(a).cloned().flatten();
            let fb = file_of.get(b).cloned().flatten();
            let ka = fa.as_ref().and_then(|p| file_rank.get(p).copied());
            let kb = fb.as_ref().and_then(|p| file_rank.get(p).copied());
            match (ka, kb) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                _ => fa.cmp(&fb).then_with(|| a.cmp(b)),
            }
        });
    }

    let down_adj = adjacency(edges, true);
    let up_adj = adjacency(edges, false);

    for pass in 0..4 {
        let downward = pass % 2 == 0;
        let neighbors = if downward { &up_adj } else { &down_adj };
        sweep(&mut by_layer, neighbors, &file_of, downward);
    }

    by_layer
}

/// `forward: true` maps a node to its predecessors (used by a downward
/// sweep, which looks at the already-ordered layer above).
fn adjacency(edges: &[LayoutEdge], forward: bool) -> HashMap<NodeId, Vec<NodeId>> {
    let mut map: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for e in edges {
        if forward {
            map.entry(e.to.clone()).or_default().push(e.from.clone());
        } else {
            map.entry(e.from.clone()).or_default().push(e.to.clone());
        }
    }
    map
}

fn sweep(
    by_layer: &mut [Vec<NodeId>],
    neighbors: &HashMap<NodeId, Vec<NodeId>>,
    file_of: &HashMap<NodeId, Option<PathBuf>>,
    downward: bool,
) {
    let range: Vec<usize> = if downward {
        (1..by_layer.len()).collect()
    } else {
        (0..by_layer.len().saturating_sub(1)).rev().collect()
    };

    for li in range {
        let ref_idx = if downward { li - 1 } else { li + 1 };
        let ref_positions: HashMap<NodeId, f64> = by_layer[ref_idx]
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as f64))
            .collect();
        let current_positions: HashMap<NodeId, f64> = by_layer[li]
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as f64))
            .collect();

        let mut barycenter: HashMap<NodeId, f64> = HashMap::new();
        for id in &by_layer[li] {
            let refs = neighbors.get(id).map(|v| v.as_slice()).unwrap_or(&[]);
            let vals: Vec<f64> = refs.iter().filter_map(|r| ref_positions.get(r).copied()).collect();
            let bc = if vals.is_empty() {
                current_positions[id]
            } else {
                vals.iter().sum::<f64>() / vals.len() as f64
            };
            barycenter.insert(id.clone(), bc);
        }

        let mut cluster_sum: HashMap<PathBuf, (f64, usize)> = HashMap::new();
        for id in &by_layer[li] {
            if let Some(Some(fp)) = file_of.get(id) {
                let e = cluster_sum.entry(fp.clone()).or_insert((0.0, 0));
                e.0 += barycenter[id];
                e.1 += 1;
            }
        }
        let cluster_bc: HashMap<PathBuf, f64> =
            cluster_sum.into_iter().map(|(k, (s, c))| (k, s / c as f64)).collect();

        by_layer[li].sort_by(|a, b| {
            let fa = file_of.get(a).cloned().flatten();
            let fb = file_of.get(b).cloned().flatten();
            let ca = fa.as_ref().and_then(|p| cluster_bc.get(p).copied()).unwrap_or(f64::MAX);
            let cb = fb.as_ref().and_then(|p| cluster_bc.get(p).copied()).unwrap_or(f64::MAX);
            ca.partial_cmp(&cb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| fa.cmp(&fb))
                .then_with(|| {
                    barycenter[a]
                        .partial_cmp(&barycenter[b])
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.cmp(b))
        });
    }
}

/// Scan layers in order; the first appearance of each file becomes its
/// position in the new cluster ordering. When `previous_order` is given,
/// retained files keep their previous relative order and newly appeared
/// files are inserted as close as possible to their natural-scan neighbors.
pub fn derive_cluster_order(
    by_layer: &[Vec<NodeId>],
    file_of: &HashMap<NodeId, Option<PathBuf>>,
    previous_order: Option<&[PathBuf]>,
) -> Vec<PathBuf> {
    let mut natural = Vec::new();
    let mut seen = HashSet::new();
    for layer in by_layer {
        for id in layer {
            if let Some(Some(fp)) = file_of.get(id)
                && seen.insert(fp.clone())
            {
                natural.push(fp.clone());
            }
        }
    }

    let Some(prev) = previous_order else {
        return natural;
    };

    let present: HashSet<&PathBuf> = natural.iter().collect();
    let mut result: Vec<PathBuf> = prev.iter().filter(|p| present.contains(p)).cloned().collect();
    let mut placed: HashSet<PathBuf> = result.iter().cloned().collect();

    for (i, fp) in natural.iter().enumerate() {
        if placed.contains(fp) {
            continue;
        }
        let insert_at = natural[..i]
            .iter()
            .rev()
            .find_map(|n| result.iter().position(|r| r == n))
            .map(|p| p + 1)
            .unwrap_or(0);
        result.insert(insert_at.min(result.len()), fp.clone());
        placed.insert(fp.clone());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKind;

    fn node(id: &str, file: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            file_path: Some(PathBuf::from(file)),
            label: id.to_string(),
            is_dummy: false,
            is_collapsed: false,
            folded_count: 0,
        }
    }

    fn edge(from: &str, to: &str) -> LayoutEdge {
        LayoutEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind: EdgeKind::Direct,
            call_line: 1,
            is_backedge: false,
            chain_id: 0,
        }
    }

    #[test]
    fn cluster_order_preserves_retained_neighbors_on_collapse() {
        let by_layer = vec![
            vec!["a".to_string()],
            vec!["b".to_string()],
            vec!["c".to_string()],
        ];
        let file_of: HashMap<NodeId, Option<PathBuf>> = [
            ("a".to_string(), Some(PathBuf::from("a.ts"))),
            ("b".to_string(), Some(PathBuf::from("b.ts"))),
            ("c".to_string(), Some(PathBuf::from("c.ts"))),
        ]
        .into_iter()
        .collect();

        let order = derive_cluster_order(&by_layer, &file_of, None);
        assert_eq!(order, vec![PathBuf::from("a.ts"), PathBuf::from("b.ts"), PathBuf::from("c.ts")]);

        // Collapse b.ts: it's no longer present as a distinct file in the layer scan.
        let by_layer_collapsed = vec![vec!["a".to_string()], vec!["__collapsed:b.ts".to_string()], vec!["c".to_string()]];
        let file_of_collapsed: HashMap<NodeId, Option<PathBuf>> = [
            ("a".to_string(), Some(PathBuf::from("a.ts"))),
            ("__collapsed:b.ts".to_string(), Some(PathBuf::from("b.ts"))),
            ("c".to_string(), Some(PathBuf::from("c.ts"))),
        ]
        .into_iter()
        .collect();
        let order2 = derive_cluster_order(&by_layer_collapsed, &file_of_collapsed, Some(&order));
        let pos_a = order2.iter().position(|p| p == &PathBuf::from("a.ts")).unwrap();
        let pos_c = order2.iter().position(|p| p == &PathBuf::from("c.ts")).unwrap();
        assert!(pos_a < pos_c);
    }

    #[test]
    fn barycenter_sweep_keeps_same_file_nodes_contiguous() {
        let nodes = vec![
            node("a1", "a.ts"),
            node("a2", "a.ts"),
            node("b1", "b.ts"),
        ];
        let edges = vec![edge("a1", "a2"), edge("a1", "b1")];
        let mut layers = HashMap::new();
        layers.insert("a1".to_string(), 0);
        layers.insert("a2".to_string(), 1);
        layers.insert("b1".to_string(), 1);

        let by_layer = order_layers(&nodes, &edges, &layers, None);
        assert_eq!(by_layer[0], vec!["a1".to_string()]);
        assert_eq!(by_layer[1].len(), 2);
    }
}
