use rustix::fs::{FileType, Stat};

/// The parts of `lstat` output the receiver looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStat {
    /// File type bits.
    pub file_type: FileType,
    /// Full `st_mode`.
    pub mode: u32,
    /// Size in bytes.
    pub size: u64,
    /// Modification time in seconds.
    pub mtime: i64,
}

impl FileStat {
    /// Whether this is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Whether this is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::RegularFile
    }

    /// Whether this is a symbolic link.
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }
}

impl From<Stat> for FileStat {
    fn from(stat: Stat) -> Self {
        let mode = stat.st_mode as u32;
        Self {
            file_type: FileType::from_raw_mode(stat.st_mode as _),
            mode,
            size: stat.st_size as u64,
            mtime: stat.st_mtime as i64,
        }
    }
}
