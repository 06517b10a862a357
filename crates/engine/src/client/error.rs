//! Failures establishing or running a session.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

use crate::error::ReceiverError;

/// Errors raised by [`run_client`](super::run_client) and
/// [`serve_receiver`](crate::serve_receiver).
#[derive(Debug, Error)]
pub enum ClientError {
    /// An operand or option could not be understood.
    #[error("{0}")]
    Syntax(String),

    /// The remote shell could not be started.
    #[error("failed to start remote shell {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The daemon host could not be resolved or reached.
    #[error("failed to {action} {target}: {source}")]
    Socket {
        /// What was being attempted.
        action: &'static str,
        /// Host and port.
        target: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The version or seed exchange failed.
    #[error("protocol handshake: {0}")]
    Handshake(#[source] io::Error),

    /// The daemon refused the request.
    #[error("daemon: {0}")]
    Daemon(String),

    /// The peer speaks a protocol older than ours.
    #[error("remote protocol {remote} is older than our own ({local}): this is not supported")]
    OldProtocol {
        /// Version announced by the peer.
        remote: i32,
        /// Our version.
        local: i32,
    },

    /// The session itself failed.
    #[error(transparent)]
    Receiver(#[from] ReceiverError),

    /// The remote shell exited unsuccessfully after the session.
    #[error("remote shell exited with {0}")]
    RemoteExit(ExitStatus),
}
