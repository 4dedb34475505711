mod cli;
mod config_loader;

use std::io::Write as _;

use anyhow::{Context, Result};
use clap::Parser;

use callpath::diagnostics::{DiagnosticSink, TracingSink};
use callpath::export::{dot, json};
use callpath::layout::{Direction, LayoutEngine};
use callpath::resolver::ResolverConfig;
use callpath::Pipeline;

use cli::{Cli, Commands, Format, LayoutDirection};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let repo_root = cli
        .repo
        .canonicalize()
        .with_context(|| format!("repository root does not exist: {}", cli.repo.display()))?;
    let config = config_loader::load(&repo_root, cli.config.as_deref());

    match cli.command {
        Commands::Graph {
            sources,
            targets,
            max_depth,
            max_nodes,
            include_external,
            format,
        } => run_graph(config, repo_root, sources, targets, max_depth, max_nodes, include_external, format),

        Commands::Layout {
            sources,
            targets,
            max_depth,
            max_nodes,
            include_external,
            collapse,
            direction,
            prev_order,
        } => run_layout(
            config,
            repo_root,
            sources,
            targets,
            max_depth,
            max_nodes,
            include_external,
            collapse,
            direction,
            prev_order,
        ),
    }
}

fn run_graph(
    mut config: ResolverConfig,
    repo_root: std::path::PathBuf,
    sources: Vec<String>,
    targets: Vec<String>,
    max_depth: usize,
    max_nodes: usize,
    include_external: bool,
    format: Format,
) -> Result<()> {
    config.include_external = include_external || config.include_external;

    let mut pipeline = Pipeline::new(config, max_depth, max_nodes)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut sink: Box<dyn DiagnosticSink> = Box::new(TracingSink);
    let (graph, source_ids, target_ids) = pipeline
        .build_and_slice(&sources, &targets, sink.as_mut())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    match format {
        Format::Dot => {
            let opts = dot::RenderOptions {
                repo_root: &repo_root,
                sources: &source_ids,
                targets: &target_ids,
            };
            println!("{}", dot::render(&graph, &opts));
        }
        Format::Json => {
            let doc = json::build_document(&graph, &repo_root, &source_ids, &target_ids, None, None);
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_layout(
    mut config: ResolverConfig,
    repo_root: std::path::PathBuf,
    sources: Vec<String>,
    targets: Vec<String>,
    max_depth: usize,
    max_nodes: usize,
    include_external: bool,
    collapse: Vec<std::path::PathBuf>,
    direction: LayoutDirection,
    prev_order: Option<std::path::PathBuf>,
) -> Result<()> {
    config.include_external = include_external || config.include_external;

    let mut pipeline = Pipeline::new(config, max_depth, max_nodes)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let mut sink: Box<dyn DiagnosticSink> = Box::new(TracingSink);
    let (graph, _sources, _targets) = pipeline
        .build_and_slice(&sources, &targets, sink.as_mut())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let previous_file_order: Option<Vec<std::path::PathBuf>> = prev_order
        .map(|p| -> Result<Vec<std::path::PathBuf>> {
            let text = std::fs::read_to_string(&p)
                .with_context(|| format!("cannot read previous order file {}", p.display()))?;
            Ok(serde_json::from_str(&text)?)
        })
        .transpose()?;

    let engine = LayoutEngine::new(match direction {
        LayoutDirection::Tb => Direction::TopToBottom,
        LayoutDirection::Lr => Direction::LeftToRight,
    });
    let collapse: Vec<std::path::PathBuf> = collapse
        .into_iter()
        .map(|p| repo_root.join(p))
        .collect();
    let result = engine.layout(&graph, &collapse, previous_file_order.as_deref());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    let _ = std::io::stderr().flush();
}
