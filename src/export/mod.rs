//! Rendering a built/sliced graph: Graphviz text for humans, JSON for
//! downstream tooling.

pub mod dot;
pub mod json;
