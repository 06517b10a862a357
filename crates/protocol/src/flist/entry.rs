//! Remote file list entries.

use std::path::{Component, Path, PathBuf};

/// File type bits of a mode value.
pub const S_IFMT: u32 = 0o170_000;
/// Directory type bits.
pub const S_IFDIR: u32 = 0o040_000;
/// Regular file type bits.
pub const S_IFREG: u32 = 0o100_000;
/// Symbolic link type bits.
pub const S_IFLNK: u32 = 0o120_000;

/// Coarse classification of an entry's mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// A regular file.
    Regular,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
    /// Devices, FIFOs, sockets and anything else.
    Other,
}

impl EntryKind {
    /// Classifies a raw mode value.
    #[must_use]
    pub const fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => Self::Regular,
            S_IFDIR => Self::Directory,
            S_IFLNK => Self::Symlink,
            _ => Self::Other,
        }
    }
}

/// A single entry of the remote file list.
///
/// The path is relative to the transfer root and never contains `..`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileEntry {
    path: PathBuf,
    mode: u32,
    mtime: i64,
    size: u64,
    link_target: Option<PathBuf>,
}

impl FileEntry {
    /// Creates an entry after validating its path.
    pub fn new(path: PathBuf, mode: u32, mtime: i64, size: u64) -> Result<Self, InvalidPath> {
        validate_relative(&path)?;
        Ok(Self {
            path,
            mode,
            mtime,
            size,
            link_target: None,
        })
    }

    /// Creates a regular file entry.
    pub fn file(
        path: impl Into<PathBuf>,
        permissions: u32,
        mtime: i64,
        size: u64,
    ) -> Result<Self, InvalidPath> {
        Self::new(path.into(), S_IFREG | (permissions & 0o7777), mtime, size)
    }

    /// Creates a directory entry.
    pub fn directory(
        path: impl Into<PathBuf>,
        permissions: u32,
        mtime: i64,
    ) -> Result<Self, InvalidPath> {
        Self::new(path.into(), S_IFDIR | (permissions & 0o7777), mtime, 0)
    }

    /// Creates a symbolic link entry.
    pub fn symlink(
        path: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        mtime: i64,
    ) -> Result<Self, InvalidPath> {
        let target = target.into();
        let size = target.as_os_str().len() as u64;
        let mut entry = Self::new(path.into(), S_IFLNK | 0o777, mtime, size)?;
        entry.link_target = Some(target);
        Ok(entry)
    }

    /// Attaches a symlink target.
    #[must_use]
    pub fn with_link_target(mut self, target: PathBuf) -> Self {
        self.link_target = Some(target);
        self
    }

    /// Relative path of the entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full mode value, including the type bits.
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }

    /// Permission bits only.
    #[must_use]
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Remote modification time in seconds since the epoch.
    #[must_use]
    pub const fn mtime(&self) -> i64 {
        self.mtime
    }

    /// Remote size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Symlink target, present only when links were preserved.
    #[must_use]
    pub fn link_target(&self) -> Option<&Path> {
        self.link_target.as_deref()
    }

    /// Classifies the entry.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        EntryKind::from_mode(self.mode)
    }

    /// Shorthand for `kind() == EntryKind::Directory`.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind(), EntryKind::Directory)
    }

    /// Shorthand for `kind() == EntryKind::Regular`.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind(), EntryKind::Regular)
    }
}

/// A path that would escape the transfer root.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsafe path in file list: {}", .0.display())]
pub struct InvalidPath(
    /// The rejected path.
    pub PathBuf,
);

/// Accepts only non-empty relative paths without `..` components.
pub fn validate_relative(path: &Path) -> Result<(), InvalidPath> {
    if path.as_os_str().is_empty() {
        return Err(InvalidPath(path.to_path_buf()));
    }
    let safe = path
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(())
    } else {
        Err(InvalidPath(path.to_path_buf()))
    }
}
