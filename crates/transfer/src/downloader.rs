//! Receiver half: rebuilds files from the sender's delta stream.
//!
//! The stream for one file is its index, the echoed [`SumHead`], a run of
//! tokens and a trailing whole-file MD4. A positive token announces that
//! many literal bytes, a negative token `t` copies basis block `-(t + 1)`,
//! and zero ends the data.
//!
//! # Upstream Reference
//!
//! - `receiver.c:receive_data()` - token loop and checksum verification
//! - `receiver.c:recv_files()` - temp file handling and final rename

use std::fs::{File, Permissions};
use std::io::{BufWriter, Read, Write};
use std::os::unix::fs::{FileExt, PermissionsExt};

use checksums::{FileDigest, MD4_DIGEST_LEN};
use filetime::FileTime;
use logging::{trace_copy, trace_recv};
use platform::SandboxedRoot;
use protocol::{FileEntry, FileList, read_int};

use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::sum_head::SumHead;
use crate::temp_guard::{TempFileGuard, open_tmpfile};

/// Largest literal run accepted in a single token.
pub const MAX_LITERAL_LEN: usize = 1024 * 1024;

/// Outcome of one [`Downloader::step`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DownloadStatus {
    /// More data is expected.
    Progress,
    /// The sender ended the phase with `-1`.
    PhaseDone,
}

/// A file being received into its temp file.
struct PendingDownload<'a> {
    entry: &'a FileEntry,
    head: SumHead,
    basis: Option<File>,
    out: BufWriter<File>,
    guard: TempFileGuard<'a>,
    digest: FileDigest,
    written: u64,
}

impl PendingDownload<'_> {
    fn append(&mut self, data: &[u8]) -> Result<(), TransferError> {
        self.out
            .write_all(data)
            .map_err(|error| TransferError::local(self.guard.path(), error))?;
        self.digest.update(data);
        self.written += data.len() as u64;
        Ok(())
    }
}

/// Consumes the sender's replies one token at a time.
pub struct Downloader<'a> {
    root: &'a SandboxedRoot,
    list: &'a FileList,
    config: TransferConfig,
    pending: Option<Box<PendingDownload<'a>>>,
    buffer: Vec<u8>,
    received: usize,
}

impl<'a> Downloader<'a> {
    /// Creates an idle downloader.
    pub fn new(root: &'a SandboxedRoot, list: &'a FileList, config: TransferConfig) -> Self {
        Self {
            root,
            list,
            config,
            pending: None,
            buffer: Vec::new(),
            received: 0,
        }
    }

    /// Whether a file is partially received.
    #[must_use]
    pub fn is_receiving(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of files completed (or, in dry-run, announced).
    #[must_use]
    pub const fn received(&self) -> usize {
        self.received
    }

    /// Reads and applies one message from `input`.
    ///
    /// Any error leaves the downloader unusable. A partially written temp
    /// file is removed before the error is returned.
    pub fn step<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<DownloadStatus, TransferError> {
        match self.pending.take() {
            None => self.start(input),
            Some(pending) => self.receive(input, pending),
        }
    }

    fn start<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<DownloadStatus, TransferError> {
        let raw = read_int(input)?;
        if raw == -1 {
            trace_recv!("sender finished phase after {} files", self.received);
            return Ok(DownloadStatus::PhaseDone);
        }
        let list = self.list;
        let entry = usize::try_from(raw)
            .ok()
            .and_then(|index| list.get(index))
            .ok_or_else(|| {
                TransferError::protocol(format!(
                    "file index {raw} out of range (list has {} entries)",
                    list.len()
                ))
            })?;
        if !entry.is_file() {
            return Err(TransferError::protocol(format!(
                "file index {raw} ({}) is not a regular file",
                entry.path().display()
            )));
        }

        let path = entry.path();
        if self.config.dry_run {
            trace_copy!("{}", path.display());
            self.received += 1;
            return Ok(DownloadStatus::Progress);
        }

        let head = SumHead::read_from(input)?;
        let basis = match self.root.open_read(path) {
            Ok(file) => Some(file),
            Err(error) if error.is_not_found() => None,
            Err(error) => return Err(error.into()),
        };
        let (file, guard) = open_tmpfile(self.root, path)?;
        trace_recv!(
            "receiving {} into {} ({} basis blocks)",
            path.display(),
            guard.path().display(),
            head.layout.count()
        );

        self.pending = Some(Box::new(PendingDownload {
            entry,
            head,
            basis,
            out: BufWriter::new(file),
            guard,
            digest: FileDigest::new(self.config.seed),
            written: 0,
        }));
        Ok(DownloadStatus::Progress)
    }

    fn receive<R: Read + ?Sized>(
        &mut self,
        input: &mut R,
        mut pending: Box<PendingDownload<'a>>,
    ) -> Result<DownloadStatus, TransferError> {
        let token = read_int(input)?;

        if token > 0 {
            let len = token as usize;
            if len > MAX_LITERAL_LEN {
                return Err(TransferError::protocol(format!(
                    "literal of {len} bytes exceeds {MAX_LITERAL_LEN}"
                )));
            }
            self.buffer.resize(len, 0);
            input.read_exact(&mut self.buffer)?;
            pending.append(&self.buffer)?;
        } else if token < 0 {
            let block = -(token + 1) as u32;
            let layout = pending.head.layout;
            if block >= layout.count() {
                return Err(TransferError::protocol(format!(
                    "{}: block {block} out of range ({} blocks)",
                    pending.entry.path().display(),
                    layout.count()
                )));
            }
            let basis = pending.basis.as_ref().ok_or_else(|| {
                TransferError::protocol(format!(
                    "{}: block reference without a basis file",
                    pending.entry.path().display()
                ))
            })?;
            self.buffer.resize(layout.len_of(block) as usize, 0);
            basis
                .read_exact_at(&mut self.buffer, layout.offset_of(block))
                .map_err(|error| TransferError::local(pending.entry.path(), error))?;
            pending.append(&self.buffer)?;
        } else {
            self.finish(input, *pending)?;
            self.received += 1;
            return Ok(DownloadStatus::Progress);
        }

        self.pending = Some(pending);
        Ok(DownloadStatus::Progress)
    }

    fn finish<R: Read + ?Sized>(
        &self,
        input: &mut R,
        pending: PendingDownload<'a>,
    ) -> Result<(), TransferError> {
        let PendingDownload {
            entry,
            out,
            mut guard,
            digest,
            written,
            ..
        } = pending;
        let path = entry.path();

        let mut expected = [0u8; MD4_DIGEST_LEN];
        input.read_exact(&mut expected)?;
        if digest.finalize() != expected {
            return Err(TransferError::ChecksumMismatch(path.to_path_buf()));
        }

        let file = out
            .into_inner()
            .map_err(|error| TransferError::local(guard.path(), error.into_error()))?;
        let mode = if self.config.preserve_perms {
            entry.permissions()
        } else {
            self.config.default_file_mode()
        };
        file.set_permissions(Permissions::from_mode(mode))
            .map_err(|error| TransferError::local(guard.path(), error))?;
        if self.config.preserve_times {
            let mtime = FileTime::from_unix_time(entry.mtime(), 0);
            filetime::set_file_handle_times(&file, None, Some(mtime))
                .map_err(|error| TransferError::local(guard.path(), error))?;
        }
        drop(file);

        self.root.rename(guard.path(), path)?;
        guard.keep();
        trace_copy!("{}", path.display());
        trace_recv!("{}: {written} bytes committed", path.display());
        Ok(())
    }
}

impl std::fmt::Debug for Downloader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("receiving", &self.pending.as_ref().map(|p| p.entry.path()))
            .field("received", &self.received)
            .finish_non_exhaustive()
    }
}
