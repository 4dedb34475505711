//! Layered, cluster-aware graph layout with no external graph library:
//! collapse preprocessing, backedge detection, Kahn longest-path layering,
//! dummy-node insertion, barycenter ordering, coordinate assignment, and
//! edge routing.

pub mod cluster;
pub mod coords;
pub mod layering;
pub mod ordering;
pub mod routing;

use std::path::PathBuf;

use serde::Serialize;

use crate::model::{CallGraph, EdgeKind};

/// A node identity within the layout graph: a real function's
/// `"<file>::<qualifiedName>"`, a collapsed file's `"__collapsed:<file>"`, or
/// a dummy's `"__dummy:<n>"`.
pub type NodeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    TopToBottom,
    LeftToRight,
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: NodeId,
    pub file_path: Option<PathBuf>,
    pub label: String,
    pub is_dummy: bool,
    pub is_collapsed: bool,
    pub folded_count: usize,
}

#[derive(Debug, Clone)]
pub struct LayoutEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub call_line: usize,
    pub is_backedge: bool,
    /// Groups the segments a single original edge was split into by dummy
    /// insertion, so routing can reconstruct one chain per original edge.
    pub chain_id: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_dummy: bool,
    pub is_collapsed: bool,
    pub folded_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBox {
    pub file_path: PathBuf,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub call_line: usize,
    pub is_backedge: bool,
    pub waypoints: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub clusters: Vec<ClusterBox>,
    pub edges: Vec<RoutedEdge>,
    pub file_order: Vec<PathBuf>,
}

pub struct LayoutEngine {
    pub direction: Direction,
}

impl LayoutEngine {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn layout(
        &self,
        graph: &CallGraph,
        collapsed: &[PathBuf],
        previous_file_order: Option<&[PathBuf]>,
    ) -> LayoutResult {
        let (nodes, edges) = cluster::collapse(graph, collapsed);
        let mut edges = edges;
        layering::mark_backedges(&nodes, &mut edges);
        let layers = layering::assign_layers(&nodes, &edges);
        let (nodes, edges, layers) = layering::insert_dummies(nodes, edges, layers);

        let file_of = cluster::file_index(&nodes);
        let by_layer = ordering::order_layers(&nodes, &edges, &layers, previous_file_order);
        let file_order = ordering::derive_cluster_order(&by_layer, &file_of, previous_file_order);

        let positions = coords::assign_coordinates(&by_layer, &nodes, &file_of, &file_order, self.direction);
        let routed = routing::route_edges(&nodes, &edges, &positions, self.direction);
        let clusters = cluster::cluster_rectangles(&nodes, &positions, &file_order, self.direction);

        let positioned = nodes
            .iter()
            .filter_map(|n| {
                positions.get(&n.id).map(|&(x, y, w, h)| PositionedNode {
                    id: n.id.clone(),
                    x,
                    y,
                    width: w,
                    height: h,
                    is_dummy: n.is_dummy,
                    is_collapsed: n.is_collapsed,
                    folded_count: n.folded_count,
                })
            })
            .collect();

        LayoutResult {
            nodes: positioned,
            clusters,
            edges: routed,
            file_order,
        }
    }
}
