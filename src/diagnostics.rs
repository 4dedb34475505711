//! The optional diagnostic sink a caller can install to observe file and
//! resolution faults without them aborting a build.

use crate::error::Diagnostic;

/// Receives recoverable faults as the builder encounters them. The default
/// `tracing` sink emits a `debug!` event per diagnostic; a caller may
/// implement this trait to collect them instead.
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `tracing`. Installed when a caller does not
/// supply its own sink; costs nothing beyond a disabled-level check when no
/// subscriber is registered.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::File(_) => tracing::debug!(target: "callpath::file", "{diagnostic}"),
            Diagnostic::Resolution(_) => {
                tracing::debug!(target: "callpath::resolution", "{diagnostic}")
            }
        }
    }
}

/// Collects every diagnostic into a vector, for tests and for callers that
/// want the full list rather than a live stream.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
