//! Static call-graph recovery and slicing for multi-file typed-JavaScript
//! codebases: syntactic only, no type checker, no execution.

pub mod diagnostics;
pub mod error;
pub mod export;
pub mod graph;
pub mod layout;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod selector;
pub mod slicer;

use std::collections::HashSet;
use std::path::Path;

use diagnostics::DiagnosticSink;
use error::{ConfigFault, CoreError, CoreResult};
use graph::{GraphBounds, GraphBuilder};
use model::{CallGraph, FunctionId};
use resolver::{ResolverConfig, SymbolResolver};
use selector::Selector;

/// Runs the core pipeline: resolve source/target selectors, build the
/// bounded call graph, and slice it between them. This is the entry point
/// the CLI's `graph`/`layout` subcommands drive; it owns none of the
/// argument parsing, config loading, or rendering around it.
pub struct Pipeline {
    resolver: SymbolResolver,
    bounds: GraphBounds,
    repo_root: std::path::PathBuf,
}

impl Pipeline {
    pub fn new(config: ResolverConfig, max_depth: usize, max_nodes: usize) -> CoreResult<Self> {
        if !config.base_dir.is_dir() {
            return Err(CoreError::Config(ConfigFault::MissingRepoRoot(config.base_dir)));
        }
        let bounds = GraphBounds::new(max_depth, max_nodes)?;
        let repo_root = config.base_dir.clone();
        Ok(Self {
            resolver: SymbolResolver::new(config),
            bounds,
            repo_root,
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Resolve a selector string against the repository root, expanding it
    /// into zero or more concrete function identities.
    pub fn expand_selector(&mut self, raw: &str, sink: &mut dyn DiagnosticSink) -> Vec<FunctionId> {
        let selector = Selector::parse(&self.repo_root, raw);
        match self.resolver.parsed_file(&selector.file_path, sink) {
            Some(file) => selector.expand(&file),
            None => Vec::new(),
        }
    }

    /// Build and slice the graph from `source_selectors` to `target_selectors`.
    pub fn build_and_slice(
        &mut self,
        source_selectors: &[String],
        target_selectors: &[String],
        sink: &mut dyn DiagnosticSink,
    ) -> CoreResult<(CallGraph, HashSet<FunctionId>, HashSet<FunctionId>)> {
        let sources: HashSet<FunctionId> = source_selectors
            .iter()
            .flat_map(|s| self.expand_selector(s, sink))
            .collect();
        let targets: HashSet<FunctionId> = target_selectors
            .iter()
            .flat_map(|s| self.expand_selector(s, sink))
            .collect();

        if sources.is_empty() {
            return Err(CoreError::Config(ConfigFault::EmptySources));
        }
        if targets.is_empty() {
            return Err(CoreError::Config(ConfigFault::EmptyTargets));
        }

        let source_ids: Vec<FunctionId> = sources.iter().cloned().collect();
        let mut builder = GraphBuilder::new(&mut self.resolver, self.bounds);
        let graph = builder.build(&source_ids, sink);

        let sliced = slicer::slice(&graph, &source_ids, &targets.iter().cloned().collect::<Vec<_>>());
        Ok((sliced, sources, targets))
    }
}
