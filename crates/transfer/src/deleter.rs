//! Removal of local entries the sender does not list.
//!
//! # Upstream Reference
//!
//! - `generator.c:delete_in_dir()` - only directories the sender lists are
//!   pruned, so trees outside the transfer are left alone
//! - `delete.c:delete_item()` - children are removed before their directory

use std::collections::HashSet;
use std::path::Path;

use flist::LocalFileList;
use logging::trace_del;
use platform::DestinationRoot;
use protocol::FileList;

use crate::error::TransferError;

/// Deletes every local entry that is extraneous with respect to `remote`.
///
/// An entry is extraneous when the sender does not list its path and its
/// parent is either a directory the sender lists (`.` for the root) or is
/// itself extraneous. Entries are removed in reverse walk order so a
/// directory is only removed once it is empty. In a dry run nothing is
/// touched and the deletions are only logged.
///
/// Returns the number of entries deleted (or that would have been).
pub fn delete_extraneous(
    root: &DestinationRoot,
    local: &LocalFileList,
    remote: &FileList,
) -> Result<usize, TransferError> {
    let mut doomed_dirs: HashSet<&Path> = HashSet::new();
    let mut doomed = Vec::new();

    for entry in local {
        let path = entry.relative_path();
        if remote.find(path).is_some() {
            continue;
        }
        let parent = entry.parent();
        let parent_listed = remote
            .find(parent)
            .is_some_and(|(_, listed)| listed.is_dir());
        if !parent_listed && !doomed_dirs.contains(parent) {
            continue;
        }
        if entry.is_dir() {
            doomed_dirs.insert(path);
        }
        doomed.push(entry);
    }

    for entry in doomed.iter().rev() {
        let path = entry.relative_path();
        if entry.is_dir() {
            trace_del!("deleting {}/", path.display());
        } else {
            trace_del!("deleting {}", path.display());
        }
        if !root.is_dry_run() {
            root.remove(path, entry.is_dir())?;
        }
    }

    tracing::debug!(target: "rsync::delete", "{} extraneous entries", doomed.len());
    Ok(doomed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::FileEntry;
    use std::fs;

    fn remote() -> FileList {
        FileList::from_entries(vec![
            FileEntry::directory(".", 0o755, 1).unwrap(),
            FileEntry::file("keep.txt", 0o644, 1, 1).unwrap(),
            FileEntry::directory("sub", 0o755, 1).unwrap(),
            FileEntry::file("sub/keep", 0o644, 1, 1).unwrap(),
        ])
    }

    fn populate(root: &Path) {
        fs::write(root.join("keep.txt"), b"k").unwrap();
        fs::write(root.join("stale.txt"), b"s").unwrap();
        fs::create_dir_all(root.join("sub/old/deeper")).unwrap();
        fs::write(root.join("sub/keep"), b"k").unwrap();
        fs::write(root.join("sub/old/deeper/f"), b"f").unwrap();
        fs::write(root.join("sub/old/g"), b"g").unwrap();
    }

    #[test]
    fn removes_extraneous_files_and_nested_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        populate(temp.path());
        let root = DestinationRoot::prepare(temp.path(), false).expect("prepare");
        let local = LocalFileList::collect(temp.path()).expect("walk");

        let deleted = delete_extraneous(&root, &local, &remote()).expect("delete");
        assert_eq!(deleted, 5);
        assert!(temp.path().join("keep.txt").exists());
        assert!(temp.path().join("sub/keep").exists());
        assert!(!temp.path().join("stale.txt").exists());
        assert!(!temp.path().join("sub/old").exists());
    }

    #[test]
    fn directories_absent_from_the_list_are_left_alone() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("outside")).unwrap();
        fs::write(temp.path().join("outside/f"), b"f").unwrap();
        let root = DestinationRoot::prepare(temp.path(), false).expect("prepare");
        let local = LocalFileList::collect(temp.path()).expect("walk");

        // Without a "." entry the root is not part of the transfer.
        let remote = FileList::from_entries(vec![FileEntry::file("a", 0o644, 1, 1).unwrap()]);
        assert_eq!(delete_extraneous(&root, &local, &remote).expect("delete"), 0);
        assert!(temp.path().join("outside/f").exists());
    }

    #[test]
    fn dry_run_only_counts() {
        let temp = tempfile::tempdir().expect("tempdir");
        populate(temp.path());
        let root = DestinationRoot::prepare(temp.path(), true).expect("prepare");
        let local = LocalFileList::collect(temp.path()).expect("walk");

        assert_eq!(delete_extraneous(&root, &local, &remote()).expect("delete"), 5);
        assert!(temp.path().join("stale.txt").exists());
        assert!(temp.path().join("sub/old/deeper/f").exists());
    }

    #[test]
    fn nothing_to_delete() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = DestinationRoot::prepare(temp.path(), false).expect("prepare");
        let local = LocalFileList::collect(temp.path()).expect("walk");
        assert_eq!(delete_extraneous(&root, &local, &remote()).expect("delete"), 0);
    }
}
