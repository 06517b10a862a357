use std::path::Path;

use logging::trace_flist;

use crate::entry::LocalEntry;
use crate::error::WalkError;
use crate::file_list_walker::FileListWalker;

/// Every entry below a destination root, in walk order.
///
/// Walk order is depth-first pre-order with byte-wise sorted siblings, so a
/// directory always appears before anything it contains.
#[derive(Clone, Debug, Default)]
pub struct LocalFileList {
    entries: Vec<LocalEntry>,
}

impl LocalFileList {
    /// Walks `root` to completion.
    pub fn collect(root: &Path) -> Result<Self, WalkError> {
        let entries = FileListWalker::new(root)?.collect::<Result<Vec<_>, _>>()?;
        trace_flist!("local file list: {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the root was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in walk order.
    #[must_use]
    pub fn entries(&self) -> &[LocalEntry] {
        &self.entries
    }

    /// Iterates in walk order.
    pub fn iter(&self) -> std::slice::Iter<'_, LocalEntry> {
        self.entries.iter()
    }
}

impl FromIterator<LocalEntry> for LocalFileList {
    fn from_iter<I: IntoIterator<Item = LocalEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LocalFileList {
    type Item = &'a LocalEntry;
    type IntoIter = std::slice::Iter<'a, LocalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for LocalFileList {
    type Item = LocalEntry;
    type IntoIter = std::vec::IntoIter<LocalEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
