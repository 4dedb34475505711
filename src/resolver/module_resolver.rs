//! Module specifier resolution: map a module specifier and its importing
//! file to a concrete path under the project's configured settings, falling
//! back to extension probing for plain relative paths.

use std::path::{Path, PathBuf};

use oxc_resolver::{AliasValue, ResolveOptions, Resolver as OxcResolver, TsconfigOptions, TsconfigReferences};

use crate::resolver::config::{ModuleResolutionStrategy, ResolverConfig};

const RELATIVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved(PathBuf),
    BuiltinModule(String),
    Unresolved,
}

/// Wraps an `oxc_resolver::Resolver` configured from a [`ResolverConfig`],
/// with an extension-probing fallback for plain relative specifiers.
pub struct ModuleResolver {
    inner: OxcResolver,
}

impl ModuleResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        let tsconfig_path = config.base_dir.join("tsconfig.json");
        let tsconfig = tsconfig_path.exists().then(|| TsconfigOptions {
            config_file: tsconfig_path,
            references: TsconfigReferences::Auto,
        });

        let alias = config
            .path_aliases
            .iter()
            .map(|(name, paths)| {
                (
                    name.clone(),
                    paths.iter().map(|p| AliasValue::Path(p.clone())).collect(),
                )
            })
            .collect();

        let (condition_names, main_fields) = match config.module_resolution {
            ModuleResolutionStrategy::Node => (
                vec!["node".into(), "import".into()],
                vec!["main".into()],
            ),
            ModuleResolutionStrategy::Bundler => (
                vec!["import".into(), "module".into(), "browser".into()],
                vec!["module".into(), "browser".into(), "main".into()],
            ),
        };

        let inner = OxcResolver::new(ResolveOptions {
            extensions: vec![
                ".ts".into(),
                ".tsx".into(),
                ".mts".into(),
                ".js".into(),
                ".jsx".into(),
                ".mjs".into(),
                ".json".into(),
            ],
            extension_alias: vec![(".js".into(), vec![".ts".into(), ".tsx".into(), ".js".into()])],
            tsconfig,
            alias,
            condition_names,
            main_fields,
            builtin_modules: true,
            ..ResolveOptions::default()
        });

        Self { inner }
    }

    /// Resolve `specifier` as imported by `from_file`.
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> ResolutionOutcome {
        let Some(dir) = from_file.parent() else {
            return ResolutionOutcome::Unresolved;
        };

        match self.inner.resolve(dir, specifier) {
            Ok(resolution) => {
                let path = resolution.into_path_buf();
                if admits_as_project_file(&path) {
                    ResolutionOutcome::Resolved(path)
                } else {
                    ResolutionOutcome::Unresolved
                }
            }
            Err(oxc_resolver::ResolveError::Builtin { resolved, .. }) => {
                ResolutionOutcome::BuiltinModule(resolved)
            }
            Err(_) if is_relative(specifier) => probe_relative(dir, specifier),
            Err(_) => ResolutionOutcome::Unresolved,
        }
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Rule 1 of the module resolver: a path landing inside a package-manager
/// install directory is external, unless following symlinks lands it back
/// inside the real project tree (a monorepo workspace link).
fn admits_as_project_file(resolved: &Path) -> bool {
    if !has_install_dir_component(resolved) {
        return true;
    }
    match std::fs::canonicalize(resolved) {
        Ok(real) => !has_install_dir_component(&real),
        Err(_) => false,
    }
}

fn has_install_dir_component(path: &Path) -> bool {
    path.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("node_modules") | Some(".pnpm") | Some(".yarn")
        )
    })
}

/// Rule 2 of the module resolver: for a relative specifier that the
/// project-aware resolver could not place, probe each recognized extension
/// directly, then as a directory `index.<ext>`.
fn probe_relative(dir: &Path, specifier: &str) -> ResolutionOutcome {
    let candidate = dir.join(specifier);

    for ext in RELATIVE_EXTENSIONS {
        let with_ext = append_extension(&candidate, ext);
        if with_ext.is_file() {
            return ResolutionOutcome::Resolved(with_ext);
        }
    }
    for ext in RELATIVE_EXTENSIONS {
        let index = candidate.join(format!("index.{ext}"));
        if index.is_file() {
            return ResolutionOutcome::Resolved(index);
        }
    }
    ResolutionOutcome::Unresolved
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

pub fn is_external_specifier(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_tsconfig() {
        let config = ResolverConfig::new(std::env::temp_dir());
        let resolver = ModuleResolver::new(&config);
        let _ = resolver.resolve(&config.base_dir.join("fake.ts"), "fs");
    }

    #[test]
    fn external_specifier_classification() {
        assert!(is_external_specifier("react"));
        assert!(is_external_specifier("@scope/pkg"));
        assert!(!is_external_specifier("./utils"));
        assert!(!is_external_specifier("../lib"));
    }

    #[test]
    fn rejects_paths_under_an_install_directory() {
        assert!(!admits_as_project_file(Path::new("/repo/node_modules/lodash/index.js")));
        assert!(!admits_as_project_file(Path::new("/repo/.pnpm/lodash@1.0.0/node_modules/lodash/index.js")));
        assert!(admits_as_project_file(Path::new("/repo/src/utils.ts")));
    }
}
