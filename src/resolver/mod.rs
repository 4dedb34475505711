//! Resolution: turning syntactic call sites into cross-file function
//! identities. [`config`] is the settings the resolver consumes,
//! [`module_resolver`] places a module specifier on disk, and
//! [`symbol_resolver`] follows imports/exports/DI defaults/façades to the
//! concrete function a call site targets.

pub mod config;
pub mod module_resolver;
pub mod symbol_resolver;

pub use config::{ModuleResolutionStrategy, ResolverConfig, TargetSyntax};
pub use module_resolver::{ModuleResolver, ResolutionOutcome};
pub use symbol_resolver::SymbolResolver;
