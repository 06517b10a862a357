//! The one-shot capability object that owns the destination after narrowing.

use std::cell::Cell;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rustix::fs::{AtFlags, Mode, OFlags, Timespec, Timestamps};

use crate::error::SandboxError;
use crate::path::check_beneath;
use crate::resolve::{Parent, Resolve, split_beneath};
use crate::root::DestinationRoot;
use crate::stat::FileStat;

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// Filesystem access confined to the destination root.
///
/// Every method takes a path relative to the root and checks it with
/// [`check_beneath`](crate::check_beneath). The parent directory is then
/// opened beneath the root handle without following symlinks in any
/// component (`openat2` with `RESOLVE_BENEATH | RESOLVE_NO_SYMLINKS` on
/// Linux, an `O_NOFOLLOW` walk elsewhere), and the operation runs on the
/// final component relative to that parent, never following a final symlink
/// either.
///
/// Without a handle (dry-run) every operation fails with
/// [`SandboxError::DryRun`].
#[derive(Debug)]
pub struct SandboxedRoot {
    dir: Option<OwnedFd>,
}

impl SandboxedRoot {
    /// Narrows the receiver to `root`.
    ///
    /// The one-shot guard is per thread: a session runs on a single thread,
    /// and a second call on that thread returns
    /// [`SandboxError::AlreadyInstalled`]. Sandboxes installed on other
    /// threads are independent of each other.
    pub fn install(root: DestinationRoot) -> Result<Self, SandboxError> {
        if INSTALLED.with(|installed| installed.replace(true)) {
            return Err(SandboxError::AlreadyInstalled);
        }
        let path = root.path().to_path_buf();
        let dir = root.into_handle();
        tracing::debug!(
            target: "rsync::receiver",
            "sandbox installed on {} (dry run: {})",
            path.display(),
            dir.is_none()
        );
        Ok(Self { dir })
    }

    /// Whether the sandbox has a directory handle.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dir.is_none()
    }

    /// `lstat` relative to the root. A missing entry is `Ok(None)`.
    pub fn stat(&self, path: &Path) -> Result<Option<FileStat>, SandboxError> {
        let found = self
            .split("stat", path)
            .and_then(|(parent, name)| {
                rustix::fs::statat(&parent, name, AtFlags::SYMLINK_NOFOLLOW).map_err(Resolve::Os)
            });
        match found {
            Ok(stat) => Ok(Some(FileStat::from(stat))),
            Err(Resolve::Os(rustix::io::Errno::NOENT)) => Ok(None),
            Err(err) => Err(err.into_error("stat", path)),
        }
    }

    /// Opens a regular file for reading without following a final symlink.
    pub fn open_read(&self, path: &Path) -> Result<File, SandboxError> {
        self.open("open", path, OFlags::RDONLY, Mode::empty())
    }

    /// Like [`open_read`](Self::open_read) but with `O_NONBLOCK`, so the
    /// descriptor can be handed to `poll`.
    pub fn open_read_nonblocking(&self, path: &Path) -> Result<File, SandboxError> {
        self.open("open", path, OFlags::RDONLY | OFlags::NONBLOCK, Mode::empty())
    }

    /// Exclusively creates a new file for writing.
    ///
    /// Fails with `AlreadyExists` if anything occupies `path`.
    pub fn create_new(&self, path: &Path, mode: u32) -> Result<File, SandboxError> {
        self.open(
            "create",
            path,
            OFlags::WRONLY | OFlags::CREATE | OFlags::EXCL,
            Mode::from_raw_mode(mode as _),
        )
    }

    /// `mkdirat`.
    pub fn mkdir(&self, path: &Path, mode: u32) -> Result<(), SandboxError> {
        self.split("mkdir", path)
            .and_then(|(parent, name)| {
                rustix::fs::mkdirat(&parent, name, Mode::from_raw_mode(mode as _))
                    .map_err(Resolve::Os)
            })
            .map_err(|err| err.into_error("mkdir", path))
    }

    /// `symlinkat`; `target` is stored verbatim.
    pub fn symlink(&self, target: &Path, path: &Path) -> Result<(), SandboxError> {
        self.split("symlink", path)
            .and_then(|(parent, name)| {
                rustix::fs::symlinkat(target, &parent, name).map_err(Resolve::Os)
            })
            .map_err(|err| err.into_error("symlink", path))
    }

    /// `readlinkat`. A missing entry is `Ok(None)`.
    pub fn readlink(&self, path: &Path) -> Result<Option<PathBuf>, SandboxError> {
        let found = self.split("readlink", path).and_then(|(parent, name)| {
            rustix::fs::readlinkat(&parent, name, Vec::new()).map_err(Resolve::Os)
        });
        match found {
            Ok(target) => Ok(Some(PathBuf::from(OsString::from_vec(target.into_bytes())))),
            Err(Resolve::Os(rustix::io::Errno::NOENT)) => Ok(None),
            Err(err) => Err(err.into_error("readlink", path)),
        }
    }

    /// `renameat` within the root.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), SandboxError> {
        let (from_parent, from_name) = self
            .split("rename", from)
            .map_err(|err| err.into_error("rename", from))?;
        self.split("rename", to)
            .and_then(|(to_parent, to_name)| {
                rustix::fs::renameat(&from_parent, from_name, &to_parent, to_name)
                    .map_err(Resolve::Os)
            })
            .map_err(|err| err.into_error("rename", to))
    }

    /// `unlinkat`; directories use `AT_REMOVEDIR`.
    pub fn unlink(&self, path: &Path, is_dir: bool) -> Result<(), SandboxError> {
        let flags = if is_dir {
            AtFlags::REMOVEDIR
        } else {
            AtFlags::empty()
        };
        self.split("unlink", path)
            .and_then(|(parent, name)| {
                rustix::fs::unlinkat(&parent, name, flags).map_err(Resolve::Os)
            })
            .map_err(|err| err.into_error("unlink", path))
    }

    /// Sets access time to now and modification time to `mtime`.
    ///
    /// A final symlink gets its own times, not its target's.
    pub fn set_times(&self, path: &Path, mtime: i64) -> Result<(), SandboxError> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        let times = Timestamps {
            last_access: Timespec {
                tv_sec: now.as_secs() as _,
                tv_nsec: now.subsec_nanos() as _,
            },
            last_modification: Timespec {
                tv_sec: mtime as _,
                tv_nsec: 0,
            },
        };
        self.split("utimensat", path)
            .and_then(|(parent, name)| {
                rustix::fs::utimensat(&parent, name, &times, AtFlags::SYMLINK_NOFOLLOW)
                    .map_err(Resolve::Os)
            })
            .map_err(|err| err.into_error("utimensat", path))
    }

    /// Sets permission bits on a directory.
    ///
    /// The directory is opened with `O_NOFOLLOW` and changed through its
    /// descriptor, so a symlink in its place is refused.
    pub fn chmod(&self, path: &Path, mode: u32) -> Result<(), SandboxError> {
        let dir = self.open(
            "chmod",
            path,
            OFlags::RDONLY | OFlags::DIRECTORY,
            Mode::empty(),
        )?;
        rustix::fs::fchmod(&dir, Mode::from_raw_mode(mode as _))
            .map_err(|errno| SandboxError::io("chmod", path, errno))
    }

    fn open(
        &self,
        op: &'static str,
        path: &Path,
        flags: OFlags,
        mode: Mode,
    ) -> Result<File, SandboxError> {
        let flags = flags | OFlags::NOFOLLOW | OFlags::CLOEXEC;
        self.split(op, path)
            .and_then(|(parent, name)| {
                rustix::fs::openat(&parent, name, flags, mode).map_err(Resolve::Os)
            })
            .map(File::from)
            .map_err(|err| err.into_error(op, path))
    }

    fn split<'p>(
        &self,
        op: &'static str,
        path: &'p Path,
    ) -> Result<(Parent<'_>, &'p OsStr), Resolve> {
        check_beneath(path).map_err(Resolve::Sandbox)?;
        let dir = self
            .dir
            .as_ref()
            .map(AsFd::as_fd)
            .ok_or_else(|| {
                Resolve::Sandbox(SandboxError::DryRun {
                    op,
                    path: path.to_path_buf(),
                })
            })?;
        split_beneath(dir, path).map_err(Resolve::Os)
    }
}
