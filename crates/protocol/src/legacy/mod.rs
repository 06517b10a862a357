//! The ASCII `@RSYNCD:` exchange that precedes a daemon session.

/// Canonical ASCII prefix of daemon control lines.
pub const LEGACY_DAEMON_PREFIX: &str = "@RSYNCD:";

/// Prefix of fatal daemon error lines.
pub const LEGACY_ERROR_PREFIX: &str = "@ERROR";

/// Longest control line accepted from a daemon.
pub const MAX_LINE_LEN: usize = 4096;

mod lines;

pub use lines::{DaemonLine, format_daemon_greeting, parse_daemon_line, read_daemon_line};
