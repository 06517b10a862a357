use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the destination root and the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The sandbox was already installed on this thread.
    #[error("sandbox already installed")]
    AlreadyInstalled,

    /// A path was absolute, empty, or contained `..`.
    #[error("path escapes the destination root: {}", .0.display())]
    OutsideRoot(PathBuf),

    /// A mutating operation was attempted without a directory handle.
    #[error("dry run: refusing to {op} {}", path.display())]
    DryRun {
        /// Operation name.
        op: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
    },

    /// The destination root could not be created or opened.
    #[error("failed to prepare destination {}: {source}", path.display())]
    Prepare {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Setting `no_new_privs` failed.
    #[error("failed to drop privileges: {0}")]
    Privileges(#[source] io::Error),

    /// A dirfd-relative syscall failed.
    #[error("{op} {}: {source}", path.display())]
    Io {
        /// Operation name.
        op: &'static str,
        /// Path relative to the root.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl SandboxError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether the failure was a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
