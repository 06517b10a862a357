//! Errors raised while running a receiving session.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use flist::WalkError;
use platform::SandboxError;
use thiserror::Error;
use transfer::TransferError;

/// Broad class of a [`ReceiverError`], used to pick an exit status.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The stream or readiness wait failed, or the peer hung up.
    Transport,
    /// The peer violated the protocol.
    Protocol,
    /// A local filesystem operation failed.
    Filesystem,
    /// Bookkeeping could not be allocated.
    Resource,
}

/// Every failure aborts the session; there is no partial success.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// Reading or writing a session stream failed.
    #[error("stream I/O: {0}")]
    Stream(#[from] io::Error),

    /// The readiness wait itself failed.
    #[error("poll: {0}")]
    Poll(#[source] io::Error),

    /// A watched descriptor reported an error or hang-up.
    #[error("poll: {what} {condition}")]
    Descriptor {
        /// Which descriptor.
        what: &'static str,
        /// `hangup` or `bad fd`.
        condition: &'static str,
    },

    /// The file list could not be decoded.
    #[error("receiving file list: {0}")]
    FileList(#[source] io::Error),

    /// The sender reported an error while building the list.
    #[error("sender reported file list status {0}")]
    ListStatus(i32),

    /// The sender ended phase one while requests were still owed.
    #[error("sender ended the phase with {remaining} entries still to request")]
    PrematurePhaseEnd {
        /// Entries the uploader had not yet examined.
        remaining: usize,
    },

    /// The phase acknowledgement was not `-1`.
    #[error("expected phase ack -1, got {0}")]
    PhaseAck(i32),

    /// The local tree could not be enumerated for deletion.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// Preparing or using the sandbox failed.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The uploader, downloader or deletion pass failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Restoring a directory's metadata failed.
    #[error("{}: restoring directory metadata: {source}", path.display())]
    Fixup {
        /// Directory being restored.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: SandboxError,
    },

    /// Per-entry bookkeeping could not be allocated.
    #[error("allocating per-entry state: {0}")]
    Resource(#[from] TryReserveError),
}

impl ReceiverError {
    /// Classifies the failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stream(_) | Self::Poll(_) | Self::Descriptor { .. } => ErrorKind::Transport,
            Self::FileList(error) if error.kind() != io::ErrorKind::InvalidData => {
                ErrorKind::Transport
            }
            Self::FileList(_)
            | Self::ListStatus(_)
            | Self::PrematurePhaseEnd { .. }
            | Self::PhaseAck(_) => ErrorKind::Protocol,
            Self::Walk(_) | Self::Sandbox(_) | Self::Fixup { .. } => ErrorKind::Filesystem,
            Self::Transfer(error) => match error {
                TransferError::Stream(_) => ErrorKind::Transport,
                TransferError::Protocol(_) | TransferError::ChecksumMismatch(_) => {
                    ErrorKind::Protocol
                }
                TransferError::Local { .. } | TransferError::Sandbox(_) => ErrorKind::Filesystem,
            },
            Self::Resource(_) => ErrorKind::Resource,
        }
    }
}
