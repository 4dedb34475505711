//! Edge routing: straight segments or three-segment staircases for forward
//! edges, outside routing for backedges, reconstructed per original edge
//! through any dummy chain.

use std::collections::HashMap;

use super::{Direction, LayoutEdge, LayoutNode, NodeId, RoutedEdge};

const OUTSIDE_MARGIN: f64 = 60.0;

pub fn route_edges(
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    positions: &HashMap<NodeId, (f64, f64, f64, f64)>,
    direction: Direction,
) -> Vec<RoutedEdge> {
    let is_dummy: HashMap<&NodeId, bool> = nodes.iter().map(|n| (&n.id, n.is_dummy)).collect();

    let mut chains: HashMap<usize, Vec<&LayoutEdge>> = HashMap::new();
    for e in edges {
        chains.entry(e.chain_id).or_default().push(e);
    }

    let max_flow_extent = positions
        .values()
        .map(|&(x, y, w, h)| match direction {
            Direction::TopToBottom => y + h,
            Direction::LeftToRight => x + w,
        })
        .fold(0.0_f64, f64::max);

    let mut result = Vec::new();
    for (_, mut segments) in chains {
        segments.sort_by_key(|e| is_dummy.get(&e.from).copied().unwrap_or(false) as u8);
        let Some(first) = segments.first() else { continue };
        let kind = first.kind;
        let call_line = first.call_line;
        let is_backedge = first.is_backedge;

        let raw_waypoints = if is_backedge {
            let e = first;
            route_backedge(e, positions, direction, max_flow_extent)
        } else {
            let ordered = order_chain(&segments);
            let mut points = Vec::new();
            for pair in ordered.windows(2) {
                points.extend(route_segment(&pair[0], &pair[1], positions, direction));
            }
            points
        };

        let mut waypoints = Vec::new();
        for p in raw_waypoints {
            if waypoints.last() != Some(&p) {
                waypoints.push(p);
            }
        }

        let from = first.from.clone();
        let to = segments.last().map(|e| e.to.clone()).unwrap_or_else(|| first.to.clone());
        result.push(RoutedEdge {
            from,
            to,
            kind,
            call_line,
            is_backedge,
            waypoints,
        });
    }
    result
}

fn order_chain(segments: &[&LayoutEdge]) -> Vec<NodeId> {
    let mut by_from: HashMap<&NodeId, &LayoutEdge> = segments.iter().map(|e| (&e.from, *e)).collect();
    let froms: std::collections::HashSet<&NodeId> = segments.iter().map(|e| &e.from).collect();
    let tos: std::collections::HashSet<&NodeId> = segments.iter().map(|e| &e.to).collect();
    let start = froms.difference(&tos).next().copied().unwrap_or(&segments[0].from);

    let mut chain = vec![start.clone()];
    let mut cursor = start;
    while let Some(e) = by_from.remove(cursor) {
        chain.push(e.to.clone());
        cursor = &e.to;
    }
    chain
}

fn route_segment(
    from: &NodeId,
    to: &NodeId,
    positions: &HashMap<NodeId, (f64, f64, f64, f64)>,
    direction: Direction,
) -> Vec<(f64, f64)> {
    let Some(&(fx, fy, fw, fh)) = positions.get(from) else { return Vec::new() };
    let Some(&(tx, ty, tw, th)) = positions.get(to) else { return Vec::new() };

    let (source_exit, source_cross, target_entry, target_cross) = match direction {
        Direction::TopToBottom => (fy + fh, fx + fw / 2.0, ty, tx + tw / 2.0),
        Direction::LeftToRight => (fx + fw, fy + fh / 2.0, tx, ty + th / 2.0),
    };

    let p0 = point(source_exit, source_cross, direction);
    let p3 = point(target_entry, target_cross, direction);

    if (source_cross - target_cross).abs() < f64::EPSILON {
        return vec![p0, p3];
    }

    let mid_flow = (source_exit + target_entry) / 2.0;
    let p1 = point(mid_flow, source_cross, direction);
    let p2 = point(mid_flow, target_cross, direction);
    vec![p0, p1, p2, p3]
}

fn route_backedge(
    edge: &LayoutEdge,
    positions: &HashMap<NodeId, (f64, f64, f64, f64)>,
    direction: Direction,
    max_flow_extent: f64,
) -> Vec<(f64, f64)> {
    let Some(&(fx, fy, fw, fh)) = positions.get(&edge.from) else { return Vec::new() };
    let Some(&(tx, ty, tw, th)) = positions.get(&edge.to) else { return Vec::new() };

    let (source_exit, source_cross, target_exit, target_cross) = match direction {
        Direction::TopToBottom => (fy + fh, fx + fw / 2.0, ty + th, tx + tw / 2.0),
        Direction::LeftToRight => (fx + fw, fy + fh / 2.0, tx + tw, ty + th / 2.0),
    };

    let outside = max_flow_extent + OUTSIDE_MARGIN;

    vec![
        point(source_exit, source_cross, direction),
        point(outside, source_cross, direction),
        point(outside, target_cross, direction),
        point(target_exit, target_cross, direction),
    ]
}

fn point(flow: f64, cross: f64, direction: Direction) -> (f64, f64) {
    match direction {
        Direction::TopToBottom => (cross, flow),
        Direction::LeftToRight => (flow, cross),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKind;

    fn edge(from: &str, to: &str, chain_id: usize, backedge: bool) -> LayoutEdge {
        LayoutEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind: EdgeKind::Direct,
            call_line: 1,
            is_backedge: backedge,
            chain_id,
        }
    }

    fn node(id: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            file_path: None,
            label: id.to_string(),
            is_dummy: false,
            is_collapsed: false,
            folded_count: 0,
        }
    }

    #[test]
    fn straight_edge_has_two_waypoints() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "b", 0, false)];
        let mut positions = HashMap::new();
        positions.insert("a".to_string(), (10.0, 0.0, 40.0, 40.0));
        positions.insert("b".to_string(), (10.0, 100.0, 40.0, 40.0));
        let routed = route_edges(&nodes, &edges, &positions, Direction::TopToBottom);
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].waypoints.len(), 2);
    }

    #[test]
    fn backedge_routes_outside() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "b", 0, true)];
        let mut positions = HashMap::new();
        positions.insert("a".to_string(), (10.0, 100.0, 40.0, 40.0));
        positions.insert("b".to_string(), (10.0, 0.0, 40.0, 40.0));
        let routed = route_edges(&nodes, &edges, &positions, Direction::TopToBottom);
        assert!(routed[0].is_backedge);
        assert!(routed[0].waypoints.len() >= 4);
    }

    #[test]
    fn backedge_collapses_duplicate_middle_waypoints_when_columns_match() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![edge("a", "b", 0, true)];
        let mut positions = HashMap::new();
        // Same column for both nodes: the two outside waypoints land on the
        // same point and must be merged into one, not emitted twice.
        positions.insert("a".to_string(), (10.0, 100.0, 40.0, 40.0));
        positions.insert("b".to_string(), (10.0, 0.0, 40.0, 40.0));
        let routed = route_edges(&nodes, &edges, &positions, Direction::TopToBottom);
        assert!(routed[0].is_backedge);
        let waypoints = &routed[0].waypoints;
        for pair in waypoints.windows(2) {
            assert_ne!(pair[0], pair[1], "consecutive identical waypoints should be deduped");
        }
    }
}
