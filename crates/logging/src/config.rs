//! crates/logging/src/config.rs
//! Verbosity configuration derived from the `-v` count.

/// Verbosity requested on the command line.
///
/// The level follows upstream rsync's convention: `0` reports warnings and
/// errors only, `-v` lists transferred and deleted names plus the statistics
/// summary, `-vv` adds protocol and file-list diagnostics, and anything above
/// that enables wire-level tracing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerbosityConfig {
    level: u8,
}

impl VerbosityConfig {
    /// Create a configuration from a verbose level.
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        Self { level }
    }

    /// Returns the verbose level this configuration was built from.
    #[must_use]
    pub const fn level(self) -> u8 {
        self.level
    }

    /// Filter directive used when `RUST_LOG` is not set.
    #[must_use]
    pub const fn default_directive(self) -> &'static str {
        match self.level {
            0 => "warn",
            1 => "info",
            2 => "info,rsync=debug",
            _ => "trace",
        }
    }
}
