use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Recovers and slices the static call graph of a multi-file typed-JavaScript
/// codebase: syntactic only, no type checker, no execution.
#[derive(Parser, Debug)]
#[command(
    name = "callpath",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root. Selectors are resolved relative to this path.
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Path to a callpath.toml config file (defaults to <repo>/callpath.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print a diagnostic for every unresolved call and module along the way.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Export format for the `graph`/`layout` subcommands.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum Format {
    /// Graphviz DOT text (default).
    #[default]
    Dot,
    /// Interchange JSON document for downstream renderers.
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum LayoutDirection {
    #[default]
    Tb,
    Lr,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and slice the call graph from one or more sources to one or more targets.
    Graph {
        /// Source selectors, e.g. "src/app.ts" or "src/app.ts::handleRequest".
        #[arg(required = true)]
        sources: Vec<String>,

        /// Target selectors that bound the slice.
        #[arg(long = "target", required = true)]
        targets: Vec<String>,

        /// Maximum BFS depth from any source.
        #[arg(long, default_value_t = 40)]
        max_depth: usize,

        /// Maximum number of nodes visited per source before the build halts.
        #[arg(long, default_value_t = 5000)]
        max_nodes: usize,

        /// Include external (node_modules / builtin) call targets as leaf nodes.
        #[arg(long)]
        include_external: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Dot)]
        format: Format,
    },

    /// Like `graph`, but also computes a laid-out diagram (node positions, cluster boxes, routed edges).
    Layout {
        /// Source selectors.
        #[arg(required = true)]
        sources: Vec<String>,

        /// Target selectors that bound the slice.
        #[arg(long = "target", required = true)]
        targets: Vec<String>,

        /// Maximum BFS depth from any source.
        #[arg(long, default_value_t = 40)]
        max_depth: usize,

        /// Maximum number of nodes visited per source before the build halts.
        #[arg(long, default_value_t = 5000)]
        max_nodes: usize,

        /// Include external call targets as leaf nodes.
        #[arg(long)]
        include_external: bool,

        /// Files to collapse into a single cluster node (repeatable).
        #[arg(long = "collapse")]
        collapse: Vec<PathBuf>,

        /// Layout flow direction.
        #[arg(long, value_enum, default_value_t = LayoutDirection::Tb)]
        direction: LayoutDirection,

        /// JSON file with a previous run's file order, for cluster-position stability.
        #[arg(long)]
        prev_order: Option<PathBuf>,
    },
}
