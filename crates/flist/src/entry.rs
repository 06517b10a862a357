use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use protocol::EntryKind;

/// One entry discovered below the walk root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalEntry {
    pub(crate) relative_path: PathBuf,
    pub(crate) kind: EntryKind,
    pub(crate) mode: u32,
    pub(crate) depth: usize,
}

impl LocalEntry {
    /// Returns the path relative to the walk root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the final path component.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.relative_path.file_name()
    }

    /// Returns the parent path relative to the root.
    ///
    /// Entries directly below the root report `.`, matching how the root
    /// appears in a received file list.
    #[must_use]
    pub fn parent(&self) -> &Path {
        match self.relative_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// File type as seen by `lstat`.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Raw `st_mode` bits.
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }

    /// Whether the entry is a real directory (not a link to one).
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Number of components in the relative path.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}
