//! Resolution of relative paths below a directory handle without following
//! symlinks in any component.

use std::ffi::OsStr;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::path::{Component, Path};

use rustix::fs::{Mode, OFlags};
use rustix::io::Errno;

use crate::error::SandboxError;

#[cfg(target_os = "linux")]
const DIR_FLAGS: OFlags = OFlags::PATH
    .union(OFlags::DIRECTORY)
    .union(OFlags::CLOEXEC);

#[cfg(not(target_os = "linux"))]
const DIR_FLAGS: OFlags = OFlags::RDONLY
    .union(OFlags::DIRECTORY)
    .union(OFlags::CLOEXEC);

/// The directory holding the final component of a resolved path.
#[derive(Debug)]
pub(crate) enum Parent<'a> {
    /// The path has a single component; its parent is the root itself.
    Root(BorrowedFd<'a>),
    /// A directory opened beneath the root.
    Opened(OwnedFd),
}

impl AsFd for Parent<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Self::Root(fd) => fd.as_fd(),
            Self::Opened(fd) => fd.as_fd(),
        }
    }
}

/// Failure while resolving a path or running the syscall on it.
#[derive(Debug)]
pub(crate) enum Resolve {
    /// The path was rejected before any syscall.
    Sandbox(SandboxError),
    /// Resolution or the operation itself failed.
    Os(Errno),
}

impl Resolve {
    /// Attaches the operation name and path.
    pub(crate) fn into_error(self, op: &'static str, path: &Path) -> SandboxError {
        match self {
            Self::Sandbox(err) => err,
            Self::Os(errno) => SandboxError::io(op, path, errno),
        }
    }
}

/// Opens the parent directory of `path` beneath `root` and returns it with
/// the final component.
///
/// No component of the parent may be a symlink. The caller must apply its
/// own `AT_SYMLINK_NOFOLLOW`/`O_NOFOLLOW` to the final component. A path that
/// names the root itself (`.`) resolves to the root and `.`.
///
/// `path` must already have passed [`check_beneath`](crate::check_beneath).
pub(crate) fn split_beneath<'a, 'p>(
    root: BorrowedFd<'a>,
    path: &'p Path,
) -> rustix::io::Result<(Parent<'a>, &'p OsStr)> {
    let mut names: Vec<&'p OsStr> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();
    let Some(name) = names.pop() else {
        return Ok((Parent::Root(root), OsStr::new(".")));
    };
    if names.is_empty() {
        return Ok((Parent::Root(root), name));
    }
    let parent = open_dir_beneath(root, &names)?;
    Ok((Parent::Opened(parent), name))
}

#[cfg(target_os = "linux")]
fn open_dir_beneath(root: BorrowedFd<'_>, names: &[&OsStr]) -> rustix::io::Result<OwnedFd> {
    use rustix::fs::ResolveFlags;

    let relative: std::path::PathBuf = names.iter().collect();
    match rustix::fs::openat2(
        root,
        &relative,
        DIR_FLAGS,
        Mode::empty(),
        ResolveFlags::BENEATH | ResolveFlags::NO_SYMLINKS,
    ) {
        // Kernels before 5.6 lack openat2.
        Err(Errno::NOSYS) => walk_nofollow(root, names),
        other => other,
    }
}

#[cfg(not(target_os = "linux"))]
fn open_dir_beneath(root: BorrowedFd<'_>, names: &[&OsStr]) -> rustix::io::Result<OwnedFd> {
    walk_nofollow(root, names)
}

/// Opens `names` one component at a time, refusing symlinks at every step.
fn walk_nofollow(root: BorrowedFd<'_>, names: &[&OsStr]) -> rustix::io::Result<OwnedFd> {
    let flags = DIR_FLAGS | OFlags::NOFOLLOW;
    let (first, rest) = names.split_first().ok_or(Errno::INVAL)?;
    let mut dir = rustix::fs::openat(root, *first, flags, Mode::empty())?;
    for name in rest {
        dir = rustix::fs::openat(&dir, *name, flags, Mode::empty())?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;

    fn open_root(dir: &Path) -> OwnedFd {
        rustix::fs::open(dir, OFlags::RDONLY | OFlags::DIRECTORY, Mode::empty()).expect("root")
    }

    #[test]
    fn single_component_uses_the_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = open_root(temp.path());
        let (parent, name) = split_beneath(root.as_fd(), Path::new("file")).expect("split");
        assert!(matches!(parent, Parent::Root(_)));
        assert_eq!(name, "file");

        let (parent, name) = split_beneath(root.as_fd(), Path::new(".")).expect("split");
        assert!(matches!(parent, Parent::Root(_)));
        assert_eq!(name, ".");
    }

    #[test]
    fn nested_parent_is_opened() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join("a/b")).expect("dirs");
        let root = open_root(temp.path());
        let (parent, name) = split_beneath(root.as_fd(), Path::new("./a/b/c")).expect("split");
        assert!(matches!(parent, Parent::Opened(_)));
        assert_eq!(name, "c");
    }

    #[test]
    fn symlinked_parents_are_refused() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outside = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("real")).expect("dir");
        symlink(outside.path(), temp.path().join("out")).expect("symlink");
        symlink("real", temp.path().join("inner")).expect("symlink");
        let root = open_root(temp.path());

        assert!(split_beneath(root.as_fd(), Path::new("out/x")).is_err());
        assert!(split_beneath(root.as_fd(), Path::new("inner/x")).is_err());
        assert!(walk_nofollow(root.as_fd(), &[OsStr::new("out")]).is_err());
        assert!(walk_nofollow(root.as_fd(), &[OsStr::new("real")]).is_ok());
    }
}
