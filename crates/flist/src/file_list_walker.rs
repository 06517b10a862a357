use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;

use logging::trace_flist;
use protocol::EntryKind;

use crate::entry::LocalEntry;
use crate::error::WalkError;

/// Depth-first iterator over the entries below a directory.
///
/// Symbolic links are reported as links and never descended into, so the
/// walk cannot leave the root.
#[derive(Debug)]
pub struct FileListWalker {
    stack: Vec<DirectoryState>,
    finished: bool,
}

impl FileListWalker {
    /// Starts a walk below `root`, which must be a directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> Result<Self, WalkError> {
        let root = root.into();
        trace_flist!("building local file list from {}", root.display());

        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        if !metadata.file_type().is_dir() {
            return Err(WalkError::not_a_directory(root));
        }

        let top = DirectoryState::new(root, PathBuf::new(), 0)?;
        Ok(Self {
            stack: vec![top],
            finished: false,
        })
    }

    fn prepare_entry(
        &mut self,
        full_path: PathBuf,
        relative_path: PathBuf,
        depth: usize,
    ) -> Result<LocalEntry, WalkError> {
        let metadata = fs::symlink_metadata(&full_path)
            .map_err(|error| WalkError::metadata(full_path.clone(), error))?;
        let mode = metadata.mode();
        let kind = EntryKind::from_mode(mode);

        if kind == EntryKind::Directory {
            let state = DirectoryState::new(full_path, relative_path.clone(), depth)?;
            self.stack.push(state);
        }

        Ok(LocalEntry {
            relative_path,
            kind,
            mode,
            depth,
        })
    }
}

impl Iterator for FileListWalker {
    type Item = Result<LocalEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let (full_path, relative_path, depth) = {
                let state = self.stack.last_mut()?;
                let Some(name) = state.next_name() else {
                    self.stack.pop();
                    continue;
                };
                let full_path = state.fs_path.join(&name);
                let relative_path = state.relative_prefix.join(&name);
                (full_path, relative_path, state.depth + 1)
            };

            match self.prepare_entry(full_path, relative_path, depth) {
                Ok(entry) => return Some(Ok(entry)),
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
struct DirectoryState {
    fs_path: PathBuf,
    relative_prefix: PathBuf,
    entries: std::vec::IntoIter<OsString>,
    depth: usize,
}

impl DirectoryState {
    fn new(fs_path: PathBuf, relative_prefix: PathBuf, depth: usize) -> Result<Self, WalkError> {
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;
        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|error| WalkError::read_dir_entry(fs_path.clone(), error))?;
            entries.push(entry.file_name());
        }
        entries.sort();

        trace_flist!("found {} entries in {}", entries.len(), fs_path.display());

        Ok(Self {
            fs_path,
            relative_prefix,
            entries: entries.into_iter(),
            depth,
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        self.entries.next()
    }
}
