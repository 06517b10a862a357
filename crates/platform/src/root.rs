use std::fs;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Path, PathBuf};

use rustix::fs::{AtFlags, Mode, OFlags};

use crate::error::SandboxError;
use crate::path::check_beneath;
use crate::resolve::split_beneath;

/// The destination directory before the sandbox is installed.
///
/// Holds an open handle on the root (absent in dry-run) together with the
/// path it came from. The deletion pass works on this type; installing the
/// sandbox consumes it.
#[derive(Debug)]
pub struct DestinationRoot {
    path: PathBuf,
    dir: Option<OwnedFd>,
}

impl DestinationRoot {
    /// Creates `path` with intermediates and opens it.
    ///
    /// In dry-run nothing is created and no handle is opened.
    pub fn prepare(path: &Path, dry_run: bool) -> Result<Self, SandboxError> {
        if dry_run {
            return Ok(Self {
                path: path.to_path_buf(),
                dir: None,
            });
        }

        let prepare_err = |source| SandboxError::Prepare {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(path).map_err(prepare_err)?;
        let dir = rustix::fs::open(
            path,
            OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|errno| prepare_err(errno.into()))?;

        tracing::debug!(target: "rsync::receiver", "opened destination {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            dir: Some(dir),
        })
    }

    /// The path the root was prepared from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this root was prepared for a dry run.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dir.is_none()
    }

    /// Removes an entry below the root; directories must already be empty.
    ///
    /// Parent components are resolved without following symlinks.
    pub fn remove(&self, relative: &Path, is_dir: bool) -> Result<(), SandboxError> {
        check_beneath(relative)?;
        let dir = self.handle("remove", relative)?;
        let flags = if is_dir {
            AtFlags::REMOVEDIR
        } else {
            AtFlags::empty()
        };
        split_beneath(dir, relative)
            .and_then(|(parent, name)| rustix::fs::unlinkat(&parent, name, flags))
            .map_err(|errno| SandboxError::io("unlink", relative, errno))
    }

    pub(crate) fn into_handle(self) -> Option<OwnedFd> {
        self.dir
    }

    fn handle(&self, op: &'static str, path: &Path) -> Result<BorrowedFd<'_>, SandboxError> {
        self.dir.as_ref().map(AsFd::as_fd).ok_or_else(|| SandboxError::DryRun {
            op,
            path: path.to_path_buf(),
        })
    }
}
