//! Temporary files for incoming data, named like upstream's `.name.XXXXXX`.
//!
//! # Upstream Reference
//!
//! - `receiver.c:get_tmpname()` - temp file path construction
//! - `syscall.c:do_mkstemp()` - atomic creation

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use platform::{SandboxError, SandboxedRoot};

use crate::error::TransferError;

/// Length of the random suffix including its leading dot.
const TMPNAME_SUFFIX_LEN: usize = 7;

const RAND_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const MAX_OPEN_ATTEMPTS: u32 = 100;

const NAME_MAX: usize = 255;

/// Builds the name stem `.<file name>` for a temp file beside `target`.
///
/// A leading dot on the target is consumed so dotfiles do not end up with
/// two. The stem is shortened so that stem plus suffix fits in `NAME_MAX`.
fn tmpname_stem(target: &Path) -> Vec<u8> {
    let name = target
        .file_name()
        .map_or(&b"rsync"[..], OsStrExt::as_bytes);
    let name = name.strip_prefix(b".").unwrap_or(name);

    let mut stem = Vec::with_capacity(name.len() + 1);
    stem.push(b'.');
    stem.extend_from_slice(name);
    stem.truncate(NAME_MAX - TMPNAME_SUFFIX_LEN);
    while stem.len() > 1 && stem.last() == Some(&b'.') {
        stem.pop();
    }
    stem
}

fn random_suffix() -> io::Result<[u8; TMPNAME_SUFFIX_LEN]> {
    let mut random = [0u8; TMPNAME_SUFFIX_LEN - 1];
    getrandom::fill(&mut random).map_err(|error| io::Error::other(error.to_string()))?;

    let mut suffix = [b'.'; TMPNAME_SUFFIX_LEN];
    for (slot, byte) in suffix[1..].iter_mut().zip(random) {
        *slot = RAND_CHARS[usize::from(byte) % RAND_CHARS.len()];
    }
    Ok(suffix)
}

/// Exclusively creates a temp file in the same directory as `target`.
///
/// Collisions are retried with a fresh suffix. The returned guard removes the
/// file when dropped unless [`TempFileGuard::keep`] was called.
pub(crate) fn open_tmpfile<'a>(
    root: &'a SandboxedRoot,
    target: &Path,
) -> Result<(File, TempFileGuard<'a>), TransferError> {
    let stem = tmpname_stem(target);
    let parent = target.parent().unwrap_or(Path::new(""));

    for _ in 0..MAX_OPEN_ATTEMPTS {
        let suffix = random_suffix().map_err(|error| TransferError::local(target, error))?;
        let mut name = stem.clone();
        name.extend_from_slice(&suffix);
        let path = parent.join(OsString::from_vec(name));

        match root.create_new(&path, 0o600) {
            Ok(file) => return Ok((file, TempFileGuard::new(root, path))),
            Err(SandboxError::Io { source, .. }) if source.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error.into()),
        }
    }

    Err(TransferError::local(
        target,
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "failed to create temp file after {MAX_OPEN_ATTEMPTS} attempts: {}",
                OsStr::from_bytes(&stem).to_string_lossy()
            ),
        ),
    ))
}

/// Removes a temp file on drop unless the transfer committed it.
#[derive(Debug)]
pub(crate) struct TempFileGuard<'a> {
    root: &'a SandboxedRoot,
    path: PathBuf,
    keep_on_drop: bool,
}

impl<'a> TempFileGuard<'a> {
    pub(crate) const fn new(root: &'a SandboxedRoot, path: PathBuf) -> Self {
        Self {
            root,
            path,
            keep_on_drop: false,
        }
    }

    /// Marks the file as renamed into place.
    pub(crate) fn keep(&mut self) {
        self.keep_on_drop = true;
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if !self.keep_on_drop {
            if let Err(error) = self.root.unlink(&self.path, false) {
                tracing::debug!(
                    target: "rsync::receiver",
                    "leaving temp file {}: {error}",
                    self.path.display()
                );
            }
        }
    }
}
