//! Graph construction: a write-once parse cache plus the bounded
//! breadth-first builder that turns a set of sources into a [`crate::model::CallGraph`].

pub mod builder;
pub mod cache;

pub use builder::{GraphBounds, GraphBuilder};
pub use cache::ParsedFileCache;
