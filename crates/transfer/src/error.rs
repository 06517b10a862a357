//! Error type shared by the transfer workers.

use std::io;
use std::path::PathBuf;

use platform::SandboxError;
use thiserror::Error;

/// Failures raised while requesting, receiving or deleting entries.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Reading from or writing to the peer failed.
    #[error("stream I/O: {0}")]
    Stream(#[from] io::Error),

    /// The peer sent something that violates the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The reconstructed file does not match the sender's checksum.
    #[error("{}: whole-file checksum mismatch", .0.display())]
    ChecksumMismatch(PathBuf),

    /// Local file I/O outside the sandbox wrappers failed.
    #[error("{}: {source}", path.display())]
    Local {
        /// Entry being processed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A sandboxed filesystem operation failed.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl TransferError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub(crate) fn local(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Local {
            path: path.into(),
            source,
        }
    }
}
