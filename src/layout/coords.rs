//! Coordinate assignment: layer positions along the flow axis, cluster bands
//! and centered placement along the cross axis.

use std::collections::HashMap;
use std::path::PathBuf;

use super::{Direction, LayoutNode, NodeId};

const CHAR_WIDTH: f64 = 7.0;
const LABEL_PADDING: f64 = 16.0;
const NODE_FLOW_SIZE: f64 = 40.0;
const DUMMY_FLOW_SIZE: f64 = 10.0;
const DUMMY_CROSS_SIZE: f64 = 0.0;
const LAYER_GAP: f64 = 70.0;
const NODE_CROSS_GAP: f64 = 24.0;
const CLUSTER_GAP: f64 = 48.0;
const HEADER_RESERVE: f64 = 28.0;

fn flow_size(node: &LayoutNode) -> f64 {
    if node.is_dummy {
        DUMMY_FLOW_SIZE
    } else {
        NODE_FLOW_SIZE
    }
}

fn cross_size(node: &LayoutNode) -> f64 {
    if node.is_dummy {
        DUMMY_CROSS_SIZE
    } else {
        node.label.len() as f64 * CHAR_WIDTH + LABEL_PADDING
    }
}

/// Returns, per node id, `(x, y, width, height)`.
pub fn assign_coordinates(
    by_layer: &[Vec<NodeId>],
    nodes: &[LayoutNode],
    file_of: &HashMap<NodeId, Option<PathBuf>>,
    cluster_order: &[PathBuf],
    direction: Direction,
) -> HashMap<NodeId, (f64, f64, f64, f64)> {
    let node_by_id: HashMap<&NodeId, &LayoutNode> = nodes.iter().map(|n| (&n.id, n)).collect();

    // Flow axis: cumulative layer offsets sized by the layer's tallest node.
    let mut layer_flow_start = Vec::with_capacity(by_layer.len());
    let mut cursor = 0.0;
    for layer in by_layer {
        layer_flow_start.push(cursor);
        let extent = layer
            .iter()
            .filter_map(|id| node_by_id.get(id))
            .map(|n| flow_size(n))
            .fold(0.0_f64, f64::max);
        cursor += extent.max(NODE_FLOW_SIZE) + LAYER_GAP;
    }

    // Cross axis: each cluster's band width is the max, over all layers, of
    // that file's contiguous group extent within the layer.
    let mut band_width: HashMap<PathBuf, f64> = HashMap::new();
    for layer in by_layer {
        let mut i = 0;
        while i < layer.len() {
            let Some(Some(fp)) = file_of.get(&layer[i]) else {
                i += 1;
                continue;
            };
            let mut j = i;
            let mut group_width = 0.0;
            while j < layer.len() && file_of.get(&layer[j]).cloned().flatten().as_ref() == Some(fp) {
                if let Some(n) = node_by_id.get(&layer[j]) {
                    if j > i {
                        group_width += NODE_CROSS_GAP;
                    }
                    group_width += cross_size(n);
                }
                j += 1;
            }
            let entry = band_width.entry(fp.clone()).or_insert(0.0);
            if group_width > *entry {
                *entry = group_width;
            }
            i = j;
        }
    }

    let header_reserve = if direction == Direction::LeftToRight { HEADER_RESERVE } else { 0.0 };
    let mut band_start: HashMap<PathBuf, f64> = HashMap::new();
    let mut cursor = 0.0;
    for fp in cluster_order {
        let width = band_width.get(fp).copied().unwrap_or(0.0);
        band_start.insert(fp.clone(), cursor + header_reserve);
        cursor += header_reserve + width + CLUSTER_GAP;
    }

    let mut flow_cross: HashMap<NodeId, (f64, f64)> = HashMap::new();
    for (li, layer) in by_layer.iter().enumerate() {
        let layer_extent = layer
            .iter()
            .filter_map(|id| node_by_id.get(id))
            .map(|n| flow_size(n))
            .fold(0.0_f64, f64::max)
            .max(NODE_FLOW_SIZE);
        let layer_flow_center = layer_flow_start[li] + layer_extent / 2.0;

        let mut i = 0;
        while i < layer.len() {
            let fp = file_of.get(&layer[i]).cloned().flatten();
            let mut j = i;
            let mut group_width = 0.0;
            while j < layer.len() && file_of.get(&layer[j]).cloned().flatten() == fp {
                if let Some(n) = node_by_id.get(&layer[j]) {
                    if j > i {
                        group_width += NODE_CROSS_GAP;
                    }
                    group_width += cross_size(n);
                }
                j += 1;
            }

            let band = fp.as_ref().and_then(|p| band_start.get(p)).copied().unwrap_or(0.0);
            let band_w = fp.as_ref().and_then(|p| band_width.get(p)).copied().unwrap_or(group_width);
            let mut pos = band + (band_w - group_width) / 2.0;

            for k in i..j {
                if let Some(n) = node_by_id.get(&layer[k]) {
                    let size = cross_size(n);
                    let center = pos + size / 2.0;
                    flow_cross.insert(layer[k].clone(), (layer_flow_center, center));
                    pos += size + NODE_CROSS_GAP;
                }
            }
            i = j;
        }
    }

    flow_cross
        .into_iter()
        .map(|(id, (flow_center, cross_center))| {
            let n = node_by_id.get(&id).copied();
            let fsize = n.map(flow_size).unwrap_or(NODE_FLOW_SIZE);
            let csize = n.map(cross_size).unwrap_or(0.0);
            let rect = match direction {
                Direction::TopToBottom => (cross_center - csize / 2.0, flow_center - fsize / 2.0, csize, fsize),
                Direction::LeftToRight => (flow_center - fsize / 2.0, cross_center - csize / 2.0, fsize, csize),
            };
            (id, rect)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, file: &str, dummy: bool) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            file_path: Some(PathBuf::from(file)),
            label: id.to_string(),
            is_dummy: dummy,
            is_collapsed: false,
            folded_count: 0,
        }
    }

    #[test]
    fn nodes_of_the_same_layer_share_a_flow_coordinate() {
        let nodes = vec![node("a", "x.ts", false), node("b", "y.ts", false)];
        let by_layer = vec![vec!["a".to_string(), "b".to_string()]];
        let file_of: HashMap<NodeId, Option<PathBuf>> = nodes.iter().map(|n| (n.id.clone(), n.file_path.clone())).collect();
        let order = vec![PathBuf::from("x.ts"), PathBuf::from("y.ts")];
        let coords = assign_coordinates(&by_layer, &nodes, &file_of, &order, Direction::TopToBottom);
        assert_eq!(coords["a"].1, coords["b"].1);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let nodes = vec![node("a", "x.ts", false), node("b", "x.ts", false)];
        let by_layer = vec![vec!["a".to_string(), "b".to_string()]];
        let file_of: HashMap<NodeId, Option<PathBuf>> = nodes.iter().map(|n| (n.id.clone(), n.file_path.clone())).collect();
        let order = vec![PathBuf::from("x.ts")];
        let c1 = assign_coordinates(&by_layer, &nodes, &file_of, &order, Direction::TopToBottom);
        let c2 = assign_coordinates(&by_layer, &nodes, &file_of, &order, Direction::TopToBottom);
        assert_eq!(c1["a"], c2["a"]);
        assert_eq!(c1["b"], c2["b"]);
    }
}
