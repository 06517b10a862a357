use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error returned when traversal fails.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct WalkError {
    #[source]
    kind: WalkErrorKind,
}

/// The specific step that failed.
#[derive(Debug, Error)]
pub enum WalkErrorKind {
    /// The root could not be inspected.
    #[error("failed to inspect walk root '{}': {source}", path.display())]
    RootMetadata {
        /// Root path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The root exists but is not a directory.
    #[error("walk root '{}' is not a directory", path.display())]
    NotADirectory {
        /// Root path.
        path: PathBuf,
    },
    /// A directory could not be opened for listing.
    #[error("failed to read directory '{}': {source}", path.display())]
    ReadDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Reading one entry of a directory failed.
    #[error("failed to read entry in '{}': {source}", path.display())]
    ReadDirEntry {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// `lstat` on an entry failed.
    #[error("failed to inspect metadata for '{}': {source}", path.display())]
    Metadata {
        /// Entry path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    pub(crate) fn root_metadata(path: PathBuf, source: io::Error) -> Self {
        Self::from(WalkErrorKind::RootMetadata { path, source })
    }

    pub(crate) fn not_a_directory(path: PathBuf) -> Self {
        Self::from(WalkErrorKind::NotADirectory { path })
    }

    pub(crate) fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::from(WalkErrorKind::ReadDir { path, source })
    }

    pub(crate) fn read_dir_entry(path: PathBuf, source: io::Error) -> Self {
        Self::from(WalkErrorKind::ReadDirEntry { path, source })
    }

    pub(crate) fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::from(WalkErrorKind::Metadata { path, source })
    }

    /// Returns the specific failure that terminated traversal.
    #[must_use]
    pub const fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the filesystem path associated with the error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match &self.kind {
            WalkErrorKind::RootMetadata { path, .. }
            | WalkErrorKind::NotADirectory { path }
            | WalkErrorKind::ReadDir { path, .. }
            | WalkErrorKind::ReadDirEntry { path, .. }
            | WalkErrorKind::Metadata { path, .. } => path,
        }
    }
}

impl From<WalkErrorKind> for WalkError {
    fn from(kind: WalkErrorKind) -> Self {
        Self { kind }
    }
}
