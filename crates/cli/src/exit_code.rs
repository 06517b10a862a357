//! Process exit statuses.
//!
//! # Upstream Reference
//!
//! - `errcode.h` - numeric values
//! - `log.c:rerr_names` - descriptions

use std::fmt;

use engine::ErrorKind;
use engine::client::ClientError;

/// Exit statuses this binary can produce, numbered as upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Success (RERR_OK).
    Ok = 0,
    /// Bad arguments or operands (RERR_SYNTAX).
    Syntax = 1,
    /// The peer violated or predates the protocol (RERR_PROTOCOL).
    Protocol = 2,
    /// The daemon refused the session (RERR_STARTCLIENT).
    StartClient = 5,
    /// The daemon could not be reached (RERR_SOCKETIO).
    SocketIo = 10,
    /// A local filesystem operation failed (RERR_FILEIO).
    FileIo = 11,
    /// The session stream failed or closed early (RERR_STREAMIO).
    StreamIo = 12,
    /// The remote shell failed (RERR_IPC).
    Ipc = 14,
    /// Bookkeeping could not be allocated (RERR_MALLOC).
    Malloc = 22,
}

impl ExitCode {
    /// Numeric status.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Upstream's wording for the status.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Protocol => "protocol incompatibility",
            Self::StartClient => "error starting client-server protocol",
            Self::SocketIo => "error in socket IO",
            Self::FileIo => "error in file IO",
            Self::StreamIo => "error in rsync protocol data stream",
            Self::Ipc => "error in IPC code",
            Self::Malloc => "error allocating core memory buffers",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.as_i32())
    }
}

impl From<ErrorKind> for ExitCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Transport => Self::StreamIo,
            ErrorKind::Protocol => Self::Protocol,
            ErrorKind::Filesystem => Self::FileIo,
            ErrorKind::Resource => Self::Malloc,
        }
    }
}

impl From<&ClientError> for ExitCode {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::Syntax(_) => Self::Syntax,
            ClientError::Spawn { .. } | ClientError::RemoteExit(_) => Self::Ipc,
            ClientError::Socket { .. } => Self::SocketIo,
            ClientError::Handshake(_) => Self::StreamIo,
            ClientError::Daemon(_) => Self::StartClient,
            ClientError::OldProtocol { .. } => Self::Protocol,
            ClientError::Receiver(error) => error.kind().into(),
        }
    }
}
