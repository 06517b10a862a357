//! Establishing sessions to a remote sender.
//!
//! A remote source is reached either through a remote shell that starts
//! `rsync --server --sender` on the far side, or through an rsync daemon's
//! TCP greeting. Both end in [`run_receiver`](crate::run_receiver) with the
//! sender's stream multiplexed.
//!
//! # Upstream Reference
//!
//! - `main.c:do_cmd()` - remote shell command line
//! - `clientserver.c:start_socket_client()` - daemon connection

mod args;
mod daemon;
mod error;
mod operand;
mod remote_shell;

use std::path::Path;

pub use args::server_args;
pub use daemon::{DaemonGreeting, negotiate_module};
pub use error::ClientError;
pub use operand::{RSYNCD_PORT, RemoteSource, operand_is_remote, parse_remote_source};

use crate::options::{ReceiverOptions, Role};
use crate::receiver::ReceiverReport;

/// How to reach the remote sender.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportOptions {
    /// Remote shell command, split on whitespace.
    pub rsh: String,
    /// Program started on the remote host.
    pub rsync_path: String,
    /// Daemon port for `host::module` operands.
    pub port: Option<u16>,
    /// Number of `-v` flags forwarded to the sender.
    pub verbosity: u8,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            rsh: "ssh".to_owned(),
            rsync_path: "rsync".to_owned(),
            port: None,
            verbosity: 0,
        }
    }
}

/// Pulls `source` into `destination` as the top-level receiver.
///
/// # Errors
///
/// Any failure to parse the operand, reach the sender or complete the
/// session.
pub fn run_client(
    source: &str,
    destination: &Path,
    options: ReceiverOptions,
    transport: &TransportOptions,
) -> Result<ReceiverReport, ClientError> {
    let options = ReceiverOptions {
        role: Role::Client,
        ..options
    };
    match parse_remote_source(source, transport.port)? {
        RemoteSource::Shell { host, path } => {
            remote_shell::pull(&host, &path, destination, options, transport)
        }
        daemon @ RemoteSource::Daemon { .. } => {
            daemon::pull(&daemon, destination, options, transport)
        }
    }
}
