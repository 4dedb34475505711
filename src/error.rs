//! The core's error taxonomy.
//!
//! Configuration faults and invariant violations are fatal and returned from
//! entry points as [`CoreError`]. File faults and resolution faults never
//! reach a caller of [`crate::graph::builder::build`] directly — they are
//! recorded as [`Diagnostic`] values on a [`crate::diagnostics::DiagnosticSink`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigFault {
    #[error("source selector set is empty")]
    EmptySources,
    #[error("target selector set is empty")]
    EmptyTargets,
    #[error("maxDepth must be greater than zero")]
    ZeroMaxDepth,
    #[error("maxNodes must be greater than zero")]
    ZeroMaxNodes,
    #[error("repository root does not exist: {0}")]
    MissingRepoRoot(PathBuf),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFault),
    #[error("internal invariant violated: {0}")]
    Invariant(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// A recoverable fault recorded during a build, never propagated as an
/// [`Err`] from the entry points that produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    File(FileFault),
    Resolution(ResolutionFault),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFault {
    Unreadable { path: PathBuf, reason: String },
    ParseError { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFault {
    UnresolvedCall {
        caller: PathBuf,
        callee_token: String,
        line: usize,
    },
    UnresolvedModule {
        importer: PathBuf,
        specifier: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::File(FileFault::Unreadable { path, reason }) => {
                write!(f, "cannot read {}: {reason}", path.display())
            }
            Diagnostic::File(FileFault::ParseError { path, reason }) => {
                write!(f, "cannot parse {}: {reason}", path.display())
            }
            Diagnostic::Resolution(ResolutionFault::UnresolvedCall {
                caller,
                callee_token,
                line,
            }) => write!(
                f,
                "{}:{line}: could not resolve call to `{callee_token}`",
                caller.display()
            ),
            Diagnostic::Resolution(ResolutionFault::UnresolvedModule { importer, specifier }) => {
                write!(
                    f,
                    "{}: could not resolve module `{specifier}`",
                    importer.display()
                )
            }
        }
    }
}
