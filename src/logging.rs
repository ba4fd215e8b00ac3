//! Logging utilities for the bridge
//!
//! Uses `tracing` for structured logging with minimal overhead. Symbol
//! resolution logs missing entry points, execution paths log at trace level.

pub use tracing::{debug, error, info, trace, warn, Level};

/// Initialize logging with sensible defaults
///
/// Honors `RUST_LOG` when set; otherwise enables info (debug builds: debug)
/// for this crate only. Safe to call more than once.
pub fn init() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            EnvFilter::new("pybridge=debug")
        }
        #[cfg(not(debug_assertions))]
        {
            EnvFilter::new("pybridge=info")
        }
    });

    fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .ok();
}
