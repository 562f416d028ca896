//! The host's diagnostic channel.

use tracing::debug;

/// Capabilities a host lookup framework lends to a single lookup.
///
/// Messages are built lazily, so a host that is not explaining pays
/// nothing for them.
pub trait LookupContext: Send + Sync {
    /// Record a diagnostic message for the host's explain output.
    fn explain(&self, message: &dyn Fn() -> String);
}

/// Context that forwards explanations to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingContext;

impl LookupContext for TracingContext {
    fn explain(&self, message: &dyn Fn() -> String) {
        debug!(target: "keyvault_lookup::explain", "{}", message());
    }
}
