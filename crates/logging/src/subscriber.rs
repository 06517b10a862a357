//! crates/logging/src/subscriber.rs
//! Installs the process-wide tracing subscriber.

use std::io;

use tracing_subscriber::EnvFilter;

use super::config::VerbosityConfig;

/// Error returned when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Initialize tracing for a binary.
///
/// Events are written to standard error so that standard output stays free for
/// the protocol stream when running as `--server`. `RUST_LOG` takes precedence
/// over the verbosity-derived directive.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(VerbosityConfig::from_verbose_level(1))?;
/// tracing::info!(target: "rsync::copy", "a.txt");
/// ```
pub fn init_tracing(config: VerbosityConfig) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(config.level() > 1)
        .without_time()
        .try_init()
}
