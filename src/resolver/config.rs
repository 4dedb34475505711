//! Resolver configuration: the settings object the core *consumes* — loading
//! it from a project's `tsconfig.json`/`callpath.toml` is the binary's job,
//! not the library's (see `src/cli.rs`).

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleResolutionStrategy {
    #[default]
    Node,
    Bundler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetSyntax {
    #[default]
    TypeScript,
    JavaScript,
}

/// Settings the [`crate::resolver::module_resolver`] and
/// [`crate::resolver::symbol_resolver`] consume for one graph build.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub base_dir: PathBuf,
    pub path_aliases: Vec<(String, Vec<String>)>,
    pub module_resolution: ModuleResolutionStrategy,
    pub target_syntax: TargetSyntax,
    pub include_external: bool,
}

impl ResolverConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            path_aliases: Vec::new(),
            module_resolution: ModuleResolutionStrategy::default(),
            target_syntax: TargetSyntax::default(),
            include_external: false,
        }
    }

    pub fn with_include_external(mut self, include_external: bool) -> Self {
        self.include_external = include_external;
        self
    }

    pub fn with_path_aliases(mut self, aliases: Vec<(String, Vec<String>)>) -> Self {
        self.path_aliases = aliases;
        self
    }

    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = base_dir;
        self
    }
}
