//! Generator half of the receiver: decides what to ask the sender for.
//!
//! # Upstream Reference
//!
//! - `generator.c:recv_generator()` - per-entry decisions
//! - `generator.c:generate_and_send_sums()` - block checksum request

use std::fs::File;
use std::io::Write;
use std::os::fd::{AsFd, BorrowedFd};

use checksums::{BlockLayout, compute_block_sums};
use logging::{trace_copy, trace_genr};
use platform::SandboxedRoot;
use protocol::{CSUM_LENGTH_PHASE1, EntryKind, FileEntry, FileList, write_int};

use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::sum_head::SumHead;

/// A basis file opened for checksumming, waiting for its descriptor to
/// report readable.
#[derive(Debug)]
struct PendingUpload {
    index: usize,
    file: File,
}

/// Walks the file list and emits one request (or local action) per call.
///
/// Work is finished once every entry has been examined and the
/// end-of-requests sentinel has been written; see [`has_work`](Self::has_work).
#[derive(Debug)]
pub struct Uploader<'a> {
    root: &'a SandboxedRoot,
    list: &'a FileList,
    config: TransferConfig,
    cursor: usize,
    pending: Option<PendingUpload>,
    sentinel_sent: bool,
    requested: usize,
}

impl<'a> Uploader<'a> {
    /// Creates an uploader positioned at the first entry.
    pub fn new(root: &'a SandboxedRoot, list: &'a FileList, config: TransferConfig) -> Self {
        Self {
            root,
            list,
            config,
            cursor: 0,
            pending: None,
            sentinel_sent: false,
            requested: 0,
        }
    }

    /// Whether entries remain to be examined or the sentinel is still owed.
    #[must_use]
    pub fn has_work(&self) -> bool {
        self.cursor < self.list.len() || !self.sentinel_sent
    }

    /// Descriptor of the basis file awaiting checksumming, if any.
    #[must_use]
    pub fn pending_fd(&self) -> Option<BorrowedFd<'_>> {
        self.pending.as_ref().map(|pending| pending.file.as_fd())
    }

    /// Index of the next entry to examine.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries not yet examined.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.list.len() - self.cursor
    }

    /// Number of file requests written so far.
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Performs one unit of work.
    ///
    /// `new_dirs` is index-aligned with the file list; entries for directories
    /// this call creates are set to `true`.
    pub fn step<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        new_dirs: &mut [bool],
    ) -> Result<(), TransferError> {
        if let Some(pending) = self.pending.take() {
            self.send_sums(out, pending)?;
            self.cursor += 1;
            return Ok(());
        }

        if let Some(entry) = self.list.get(self.cursor) {
            let index = self.cursor;
            let advance = match entry.kind() {
                EntryKind::Directory => {
                    self.directory(index, entry, new_dirs)?;
                    true
                }
                EntryKind::Symlink => {
                    self.symlink(entry)?;
                    true
                }
                EntryKind::Regular => self.regular(out, index, entry)?,
                EntryKind::Other => {
                    tracing::warn!(
                        target: "rsync::generator",
                        "{}: skipping unsupported file type {:o}",
                        entry.path().display(),
                        entry.mode()
                    );
                    true
                }
            };
            if advance {
                self.cursor += 1;
            }
            return Ok(());
        }

        if !self.sentinel_sent {
            write_int(out, -1)?;
            out.flush()?;
            self.sentinel_sent = true;
            trace_genr!("sent end of requests after {} files", self.requested);
        }
        Ok(())
    }

    fn directory(
        &self,
        index: usize,
        entry: &FileEntry,
        new_dirs: &mut [bool],
    ) -> Result<(), TransferError> {
        let path = entry.path();
        if self.config.dry_run {
            trace_copy!("{}/", path.display());
            return Ok(());
        }
        match self.root.stat(path)? {
            Some(stat) if stat.is_dir() => {}
            Some(_) => {
                tracing::warn!(
                    target: "rsync::generator",
                    "{}: not a directory, skipping",
                    path.display()
                );
            }
            None => {
                self.root.mkdir(path, self.config.default_dir_mode())?;
                if let Some(flag) = new_dirs.get_mut(index) {
                    *flag = true;
                }
                trace_copy!("{}/", path.display());
            }
        }
        Ok(())
    }

    fn symlink(&self, entry: &FileEntry) -> Result<(), TransferError> {
        let path = entry.path();
        if !self.config.preserve_links {
            tracing::warn!(
                target: "rsync::generator",
                "skipping non-regular file \"{}\"",
                path.display()
            );
            return Ok(());
        }
        let target = entry.link_target().ok_or_else(|| {
            TransferError::protocol(format!("{}: symlink without a target", path.display()))
        })?;
        if self.config.dry_run {
            trace_copy!("{} -> {}", path.display(), target.display());
            return Ok(());
        }

        match self.root.stat(path)? {
            Some(stat) if stat.is_dir() => {
                tracing::warn!(
                    target: "rsync::generator",
                    "{}: directory in the way of symlink, skipping",
                    path.display()
                );
                return Ok(());
            }
            Some(stat) if stat.is_symlink() => {
                if self.root.readlink(path)?.as_deref() == Some(target) {
                    trace_genr!("{} is uptodate", path.display());
                    return Ok(());
                }
                self.root.unlink(path, false)?;
            }
            Some(_) => self.root.unlink(path, false)?,
            None => {}
        }
        self.root.symlink(target, path)?;
        trace_copy!("{} -> {}", path.display(), target.display());
        Ok(())
    }

    /// Returns whether the cursor may advance; `false` means a basis file is
    /// now pending.
    fn regular<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        index: usize,
        entry: &FileEntry,
    ) -> Result<bool, TransferError> {
        let path = entry.path();
        if self.config.dry_run {
            self.send_index(out, index)?;
            out.flush()?;
            return Ok(true);
        }

        match self.root.stat(path)? {
            None => {
                self.send_index(out, index)?;
                SumHead::default().write_to(out)?;
                out.flush()?;
                trace_genr!("{}: requesting whole file", path.display());
                Ok(true)
            }
            Some(stat) if !stat.is_file() => {
                tracing::warn!(
                    target: "rsync::generator",
                    "{}: not a regular file, skipping",
                    path.display()
                );
                Ok(true)
            }
            Some(stat) if stat.size == entry.size() && stat.mtime == entry.mtime() => {
                trace_genr!("{} is uptodate", path.display());
                Ok(true)
            }
            Some(_) => {
                let file = self.root.open_read_nonblocking(path)?;
                self.pending = Some(PendingUpload { index, file });
                Ok(false)
            }
        }
    }

    fn send_sums<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        pending: PendingUpload,
    ) -> Result<(), TransferError> {
        let PendingUpload { index, mut file } = pending;
        let path = self.list.entries()[index].path();

        let size = file
            .metadata()
            .map_err(|error| TransferError::local(path, error))?
            .len();
        let layout = BlockLayout::for_size(size);
        let sums = compute_block_sums(&mut file, layout, self.config.seed)
            .map_err(|error| TransferError::local(path, error))?;

        self.send_index(out, index)?;
        SumHead::new(layout, CSUM_LENGTH_PHASE1 as u32).write_to(out)?;
        for sum in &sums {
            write_int(out, sum.rolling as i32)?;
            out.write_all(&sum.strong[..CSUM_LENGTH_PHASE1])?;
        }
        out.flush()?;
        trace_genr!(
            "{}: sent {} block sums of {} bytes",
            path.display(),
            layout.count(),
            layout.block_len()
        );
        Ok(())
    }

    fn send_index<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        index: usize,
    ) -> Result<(), TransferError> {
        write_int(out, index as i32)?;
        self.requested += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::{RollingChecksum, block_digest};
    use filetime::{FileTime, set_file_mtime};
    use platform::DestinationRoot;
    use protocol::read_int;
    use std::fs;
    use std::os::unix::fs::{PermissionsExt, symlink};
    use std::path::Path;

    const SEED: i32 = 0x1234;

    fn config() -> TransferConfig {
        TransferConfig {
            preserve_links: true,
            seed: SEED,
            old_umask: 0o022,
            ..TransferConfig::default()
        }
    }

    fn sandbox(dir: &Path) -> SandboxedRoot {
        SandboxedRoot::install(DestinationRoot::prepare(dir, false).expect("prepare"))
            .expect("install")
    }

    fn run_to_end(uploader: &mut Uploader<'_>, new_dirs: &mut [bool]) -> Vec<u8> {
        let mut out = Vec::new();
        while uploader.has_work() {
            uploader.step(&mut out, new_dirs).expect("step");
        }
        out
    }

    fn ints(bytes: &[u8]) -> Vec<i32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn empty_list_still_sends_sentinel_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(Vec::new());
        let mut uploader = Uploader::new(&root, &list, config());

        assert!(uploader.has_work());
        let out = run_to_end(&mut uploader, &mut []);
        assert_eq!(ints(&out), [-1]);

        let mut more = Vec::new();
        uploader.step(&mut more, &mut []).expect("idle step");
        assert!(more.is_empty());
    }

    #[test]
    fn missing_file_gets_zero_sum_header() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = sandbox(temp.path());
        let list =
            FileList::from_entries(vec![FileEntry::file("a.txt", 0o644, 1000, 5).unwrap()]);
        let mut uploader = Uploader::new(&root, &list, config());

        let out = run_to_end(&mut uploader, &mut [false]);
        assert_eq!(ints(&out), [0, 0, 0, 0, 0, -1]);
        assert_eq!(uploader.requested(), 1);
    }

    #[test]
    fn existing_file_is_pending_then_checksummed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        fs::write(temp.path().join("a"), &data).expect("write");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![FileEntry::file("a", 0o644, 1, 10).unwrap()]);
        let mut uploader = Uploader::new(&root, &list, config());

        let mut out = Vec::new();
        uploader.step(&mut out, &mut [false]).expect("examine");
        assert!(out.is_empty());
        assert!(uploader.pending_fd().is_some());
        assert_eq!(uploader.cursor(), 0);

        uploader.step(&mut out, &mut [false]).expect("send sums");
        assert!(uploader.pending_fd().is_none());
        assert_eq!(uploader.cursor(), 1);

        let mut wire = out.as_slice();
        assert_eq!(read_int(&mut wire).unwrap(), 0);
        let head = SumHead::read_from(&mut wire).unwrap();
        assert_eq!(head.layout, BlockLayout::for_size(1500));
        assert_eq!(head.csum_len, 2);
        for (index, block) in data.chunks(700).enumerate() {
            let rolling = read_int(&mut wire).unwrap() as u32;
            assert_eq!(rolling, RollingChecksum::of(block), "block {index}");
            let mut strong = [0u8; 2];
            std::io::Read::read_exact(&mut wire, &mut strong).unwrap();
            assert_eq!(strong, block_digest(block, SEED)[..2]);
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn up_to_date_file_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("same");
        fs::write(&file, b"12345").expect("write");
        set_file_mtime(&file, FileTime::from_unix_time(5000, 0)).expect("mtime");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![FileEntry::file("same", 0o644, 5000, 5).unwrap()]);
        let mut uploader = Uploader::new(&root, &list, config());

        let out = run_to_end(&mut uploader, &mut [false]);
        assert_eq!(ints(&out), [-1]);
        assert_eq!(uploader.requested(), 0);
    }

    #[test]
    fn missing_directory_is_created_and_flagged() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![
            FileEntry::directory(".", 0o755, 1).unwrap(),
            FileEntry::directory("sub", 0o700, 1).unwrap(),
        ]);
        let mut uploader = Uploader::new(&root, &list, config());
        let mut new_dirs = vec![false; 2];

        run_to_end(&mut uploader, &mut new_dirs);
        assert_eq!(new_dirs, [false, true]);
        let meta = fs::metadata(temp.path().join("sub")).expect("created");
        assert!(meta.is_dir());
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);
    }

    #[test]
    fn symlinked_local_directory_does_not_redirect_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let outside = tempfile::tempdir().expect("tempdir");
        fs::write(outside.path().join("victim"), b"keep").expect("write");
        symlink(outside.path(), temp.path().join("d")).expect("symlink");
        let root = sandbox(temp.path());

        let skipped = FileList::from_entries(vec![FileEntry::directory("d", 0o700, 1).unwrap()]);
        let mut uploader = Uploader::new(&root, &skipped, config());
        let mut new_dirs = vec![false];
        run_to_end(&mut uploader, &mut new_dirs);
        assert_eq!(new_dirs, [false]);

        for entry in [
            FileEntry::directory("d/made", 0o755, 1).unwrap(),
            FileEntry::symlink("d/victim", "pwned", 1).unwrap(),
            FileEntry::file("d/victim", 0o644, 1, 4).unwrap(),
        ] {
            let list = FileList::from_entries(vec![entry]);
            let mut uploader = Uploader::new(&root, &list, config());
            let mut out = Vec::new();
            assert!(uploader.step(&mut out, &mut [false]).is_err());
        }

        assert!(!outside.path().join("made").exists());
        assert_eq!(fs::read(outside.path().join("victim")).expect("victim"), b"keep");
        assert!(fs::symlink_metadata(temp.path().join("d")).expect("link").is_symlink());
    }

    #[test]
    fn file_in_place_of_directory_is_left_alone() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("sub"), b"x").expect("write");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![FileEntry::directory("sub", 0o755, 1).unwrap()]);
        let mut uploader = Uploader::new(&root, &list, config());
        let mut new_dirs = vec![false];

        run_to_end(&mut uploader, &mut new_dirs);
        assert_eq!(new_dirs, [false]);
        assert!(temp.path().join("sub").is_file());
    }

    #[test]
    fn symlinks_are_created_and_replaced() {
        let temp = tempfile::tempdir().expect("tempdir");
        symlink("old", temp.path().join("stale")).expect("symlink");
        fs::write(temp.path().join("plain"), b"x").expect("write");
        symlink("kept", temp.path().join("same")).expect("symlink");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![
            FileEntry::symlink("fresh", "t1", 1).unwrap(),
            FileEntry::symlink("plain", "t2", 1).unwrap(),
            FileEntry::symlink("same", "kept", 1).unwrap(),
            FileEntry::symlink("stale", "new", 1).unwrap(),
        ]);
        let mut uploader = Uploader::new(&root, &list, config());

        let out = run_to_end(&mut uploader, &mut [false; 4]);
        assert_eq!(ints(&out), [-1]);
        for (name, target) in [("fresh", "t1"), ("plain", "t2"), ("same", "kept"), ("stale", "new")] {
            assert_eq!(
                fs::read_link(temp.path().join(name)).expect(name),
                Path::new(target),
                "{name}"
            );
        }
    }

    #[test]
    fn symlinks_are_skipped_without_preserve_links() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = sandbox(temp.path());
        let list = FileList::from_entries(vec![FileEntry::symlink("l", "t", 1).unwrap()]);
        let config = TransferConfig {
            preserve_links: false,
            ..config()
        };
        let mut uploader = Uploader::new(&root, &list, config);

        run_to_end(&mut uploader, &mut [false]);
        assert!(fs::symlink_metadata(temp.path().join("l")).is_err());
    }

    #[test]
    fn dry_run_sends_bare_indices() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = SandboxedRoot::install(
            DestinationRoot::prepare(&temp.path().join("absent"), true).expect("prepare"),
        )
        .expect("install");
        let list = FileList::from_entries(vec![
            FileEntry::file("a", 0o644, 1, 1).unwrap(),
            FileEntry::directory("d", 0o755, 1).unwrap(),
            FileEntry::file("d/b", 0o644, 1, 1).unwrap(),
        ]);
        let config = TransferConfig {
            dry_run: true,
            ..config()
        };
        let mut uploader = Uploader::new(&root, &list, config);
        let mut new_dirs = vec![false; 3];

        let out = run_to_end(&mut uploader, &mut new_dirs);
        assert_eq!(ints(&out), [0, 2, -1]);
        assert_eq!(new_dirs, [false; 3]);
        assert!(!temp.path().join("absent").exists());
    }
}
