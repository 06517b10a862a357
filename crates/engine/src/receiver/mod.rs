//! The receiving side of a session.
//!
//! # Upstream Reference
//!
//! - `receiver.c:rsync_receiver()` - setup, loop, fixup and phase exchange

mod fixup;
mod report;
mod transfer_loop;

#[cfg(test)]
mod tests;

use std::io::{Read, Write};
use std::os::fd::AsFd;
use std::path::Path;

use flist::LocalFileList;
use logging::{trace_flist, trace_proto, trace_recv, trace_stats};
use platform::{DestinationRoot, SandboxedRoot, UmaskGuard, drop_privileges};
use protocol::{Demultiplexer, FileList, MplexWriter, TransferStats, read_file_list, read_int, write_int};
use transfer::{Downloader, TransferConfig, Uploader, delete_extraneous};

pub use report::{Milestone, Phase, ReceiverReport};

use crate::error::ReceiverError;
use crate::options::Role;
use crate::session::Session;

use self::fixup::fix_directories;
use self::transfer_loop::run_transfer_loop;

/// Upper bound on exclusion patterns accepted from a client.
const MAX_EXCLUDE_LEN: usize = 4096;

/// Runs a complete receiving session into `root`.
///
/// `input` and `output` carry the session; `input` is also the descriptor
/// watched for readiness. Framing follows the session's multiplex flags.
///
/// Every resource the session acquires is released on return, successful or
/// not. A file being received when an error occurs has its temp file removed.
///
/// # Errors
///
/// Any transport, protocol or filesystem failure aborts the session.
pub fn run_receiver<R, W>(
    session: &Session,
    input: R,
    output: W,
    root: &Path,
) -> Result<ReceiverReport, ReceiverError>
where
    R: Read + AsFd,
    W: Write,
{
    let input = if session.multiplexed_input {
        Demultiplexer::multiplexed(input)
    } else {
        Demultiplexer::new(input)
    };
    let output = if session.multiplexed_output {
        MplexWriter::multiplexed(output)
    } else {
        MplexWriter::new(output)
    };
    Receiver {
        session,
        input,
        output,
        report: ReceiverReport::default(),
    }
    .run(root)
}

struct Receiver<'s, R, W: Write> {
    session: &'s Session,
    input: Demultiplexer<R>,
    output: MplexWriter<W>,
    report: ReceiverReport,
}

impl<R, W> Receiver<'_, R, W>
where
    R: Read + AsFd,
    W: Write,
{
    fn run(mut self, root: &Path) -> Result<ReceiverReport, ReceiverError> {
        let options = self.session.options;

        self.start()?;
        let list = self.receive_list()?;
        if list.is_empty() && options.is_top_level() {
            tracing::warn!(target: "rsync::receiver", "empty file list: nothing to transfer");
            return Ok(self.report);
        }

        let destination = DestinationRoot::prepare(root, options.dry_run)?;
        let umask = (!options.dry_run).then(|| UmaskGuard::set(0));
        let old_umask = umask.as_ref().map_or(0, UmaskGuard::previous);

        if options.deletes() {
            self.delete(&destination, &list)?;
        }

        let sandbox = SandboxedRoot::install(destination)?;
        self.report.reach(Milestone::Sandboxed);
        trace_recv!("{}: ready for phase 1 data", root.display());

        let mut new_dirs = Vec::new();
        new_dirs.try_reserve_exact(list.len())?;
        new_dirs.resize(list.len(), false);

        let config = TransferConfig {
            dry_run: options.dry_run,
            preserve_links: options.preserve_links,
            preserve_perms: options.preserve_perms,
            preserve_times: options.preserve_times,
            seed: self.session.seed,
            old_umask,
        };
        let mut uploader = Uploader::new(&sandbox, &list, config);
        let mut downloader = Downloader::new(&sandbox, &list, config);
        run_transfer_loop(
            &mut self.input,
            &mut self.output,
            &mut uploader,
            &mut downloader,
            &mut new_dirs,
        )?;
        self.report.phase = Phase::Phase1Done;
        self.report.files_requested = uploader.requested();
        self.report.files_received = downloader.received();
        self.report.reach(Milestone::TransferDone);
        trace_recv!("{}: receiver ready for phase 2 data", root.display());

        self.report.directories_fixed = fix_directories(&sandbox, &list, &new_dirs, &options)?;
        self.report.reach(Milestone::DirectoriesFixed);

        self.finish()?;
        trace_recv!("receiver finished updating");
        drop(umask);
        Ok(self.report)
    }

    /// Narrows privileges on the server, or sends the client preamble.
    fn start(&mut self) -> Result<(), ReceiverError> {
        match self.session.options.role {
            Role::Server => {
                drop_privileges()?;
                self.skip_exclusions()?;
            }
            Role::Client => {
                // An empty exclusion list.
                write_int(&mut self.output, 0)?;
                self.output.flush()?;
            }
        }
        Ok(())
    }

    /// Consumes the client's exclusion list, which this receiver does not apply.
    fn skip_exclusions(&mut self) -> Result<(), ReceiverError> {
        let mut ignored = 0usize;
        loop {
            let len = read_int(&mut self.input)?;
            if len == 0 {
                break;
            }
            let len = usize::try_from(len)
                .ok()
                .filter(|&len| len <= MAX_EXCLUDE_LEN)
                .ok_or_else(|| {
                    ReceiverError::FileList(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("exclusion pattern length {len} out of range"),
                    ))
                })?;
            let mut pattern = vec![0u8; len];
            self.input.read_exact(&mut pattern)?;
            ignored += 1;
        }
        if ignored > 0 {
            tracing::warn!(
                target: "rsync::receiver",
                "ignoring {ignored} exclusion patterns sent by the client"
            );
        }
        Ok(())
    }

    fn receive_list(&mut self) -> Result<FileList, ReceiverError> {
        let options = self.session.options;
        let list = read_file_list(&mut self.input, options.preserve_links)
            .map_err(ReceiverError::FileList)?;
        let status = read_int(&mut self.input)?;
        if status != 0 {
            return Err(ReceiverError::ListStatus(status));
        }
        trace_flist!("received file list: {} entries", list.len());
        self.report.list_len = list.len();
        self.report.reach(Milestone::ListReceived);
        Ok(list)
    }

    /// Enumerates the destination and removes what the sender does not list.
    fn delete(&mut self, destination: &DestinationRoot, list: &FileList) -> Result<(), ReceiverError> {
        let root = destination.path();
        let local = if destination.is_dry_run() && !root.exists() {
            LocalFileList::default()
        } else {
            LocalFileList::collect(root)?
        };
        self.report.reach(Milestone::LocalListCollected);
        self.report.entries_deleted = delete_extraneous(destination, &local, list)?;
        self.report.reach(Milestone::DeletionDone);
        Ok(())
    }

    /// Ends phase one, reads statistics as the client and says goodbye.
    fn finish(&mut self) -> Result<(), ReceiverError> {
        write_int(&mut self.output, -1)?;
        self.output.flush()?;
        let ack = read_int(&mut self.input)?;
        if ack != -1 {
            return Err(ReceiverError::PhaseAck(ack));
        }
        self.report.phase = Phase::Phase2Done;
        self.report.reach(Milestone::PhaseAcknowledged);
        trace_proto!("phase acknowledged");

        if self.session.options.is_top_level() {
            let stats = TransferStats::read_from(&mut self.input)?;
            trace_stats!("{stats}");
            self.report.stats = Some(stats);
            self.report.reach(Milestone::StatsReceived);
        }

        write_int(&mut self.output, -1)?;
        self.output.flush()?;
        self.report.reach(Milestone::Goodbye);
        Ok(())
    }
}
