//! Binary-only config loading: `callpath.toml` and `tsconfig.json` on disk,
//! turned into the `ResolverConfig` the library consumes. Out of the core's
//! scope by design — the library only ever takes an already-built
//! `ResolverConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use callpath::resolver::{ModuleResolutionStrategy, ResolverConfig, TargetSyntax};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct CallpathToml {
    #[serde(default)]
    resolver: ResolverSection,
}

#[derive(Debug, Default, Deserialize)]
struct ResolverSection {
    #[serde(default)]
    module_resolution: Option<String>,
    #[serde(default)]
    target_syntax: Option<String>,
    #[serde(default)]
    include_external: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct TsconfigFile {
    #[serde(default, rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Default, Deserialize)]
struct CompilerOptions {
    #[serde(default)]
    paths: HashMap<String, Vec<String>>,
    #[serde(default)]
    base_url: Option<String>,
}

/// Load `<repo>/callpath.toml` (or the explicit `config` path) and
/// `<repo>/tsconfig.json`, if present, and merge them into a `ResolverConfig`.
/// Neither file existing is not an error — every field has a sensible default.
pub fn load(repo_root: &Path, explicit_config: Option<&Path>) -> ResolverConfig {
    let mut config = ResolverConfig::new(repo_root.to_path_buf());

    let toml_path = explicit_config
        .map(PathBuf::from)
        .unwrap_or_else(|| repo_root.join("callpath.toml"));
    if let Ok(text) = std::fs::read_to_string(&toml_path) {
        match toml::from_str::<CallpathToml>(&text) {
            Ok(parsed) => {
                if let Some(strategy) = parsed.resolver.module_resolution.as_deref() {
                    config.module_resolution = parse_module_resolution(strategy);
                }
                if let Some(syntax) = parsed.resolver.target_syntax.as_deref() {
                    config.target_syntax = parse_target_syntax(syntax);
                }
                if let Some(include_external) = parsed.resolver.include_external {
                    config.include_external = include_external;
                }
            }
            Err(err) => tracing::warn!(path = %toml_path.display(), %err, "ignoring malformed callpath.toml"),
        }
    }

    let tsconfig_path = repo_root.join("tsconfig.json");
    if let Ok(text) = std::fs::read_to_string(&tsconfig_path) {
        match serde_json::from_str::<TsconfigFile>(&text) {
            Ok(parsed) => {
                if let Some(opts) = parsed.compiler_options {
                    let aliases = opts
                        .paths
                        .into_iter()
                        .map(|(pattern, targets)| (pattern, targets))
                        .collect();
                    config = config.with_path_aliases(aliases);
                    if let Some(base_url) = opts.base_url {
                        config = config.with_base_dir(repo_root.join(base_url));
                    }
                }
            }
            Err(err) => {
                tracing::warn!(path = %tsconfig_path.display(), %err, "ignoring malformed tsconfig.json")
            }
        }
    }

    config
}

fn parse_module_resolution(s: &str) -> ModuleResolutionStrategy {
    match s.to_ascii_lowercase().as_str() {
        "bundler" => ModuleResolutionStrategy::Bundler,
        _ => ModuleResolutionStrategy::Node,
    }
}

fn parse_target_syntax(s: &str) -> TargetSyntax {
    match s.to_ascii_lowercase().as_str() {
        "javascript" | "js" => TargetSyntax::JavaScript,
        _ => TargetSyntax::TypeScript,
    }
}
