//! Shared test utilities for the rxsync workspace.
//!
//! The centrepiece is [`MockSender`], a thread that plays the sending peer
//! of a protocol 27 session over one end of a Unix socket pair while the
//! code under test runs the receiver on the other end.

mod delta;
mod sender;

pub use delta::{DeltaSummary, write_delta};
pub use sender::{MockSender, SenderLog, SenderScript, socket_pair};

use std::fs;
use std::path::Path;

/// Creates a scratch directory that is removed when dropped.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("rxsync-test")
        .tempdir()
        .expect("create scratch directory")
}

/// Writes `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(&path, contents).expect("write file");
}
