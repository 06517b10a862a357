//! The ordered remote file list.

use std::cmp::Ordering;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::entry::FileEntry;

/// Byte-wise path ordering, the same `strcmp` order the sender sorts by.
fn compare_paths(a: &Path, b: &Path) -> Ordering {
    a.as_os_str().as_bytes().cmp(b.as_os_str().as_bytes())
}

/// The remote file list, sorted and free of duplicate paths.
///
/// Indices into this list are the identifiers both peers use on the wire, so
/// the ordering must match the sender's: entries are sorted byte-wise by path
/// and later duplicates of a path are dropped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileList {
    entries: Vec<FileEntry>,
}

impl FileList {
    /// Builds a list from entries in arbitrary order.
    #[must_use]
    pub fn from_entries(mut entries: Vec<FileEntry>) -> Self {
        entries.sort_by(|a, b| compare_paths(a.path(), b.path()));
        let before = entries.len();
        entries.dedup_by(|later, earlier| {
            let duplicate = later.path() == earlier.path();
            if duplicate {
                tracing::warn!(
                    target: "rsync::flist",
                    "removing duplicate name {} from file list",
                    later.path().display()
                );
            }
            duplicate
        });
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(target: "rsync::flist", "dropped {removed} duplicate entries");
        }
        Self { entries }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// All entries in wire order.
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Iterates entries in wire order.
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Looks up an entry by path.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<(usize, &FileEntry)> {
        self.entries
            .binary_search_by(|entry| compare_paths(entry.path(), path))
            .ok()
            .map(|index| (index, &self.entries[index]))
    }

    /// Number of directory entries.
    #[must_use]
    pub fn directory_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_dir()).count()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
