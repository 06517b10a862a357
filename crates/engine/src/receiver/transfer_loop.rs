//! The readiness loop interleaving the uploader and the downloader.

use std::io::{self, Read, Write};
use std::os::fd::AsFd;

use logging::trace_io;
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use protocol::{Demultiplexer, MplexWriter};
use transfer::{DownloadStatus, Downloader, Uploader};

use crate::error::ReceiverError;

/// Readiness of the two wait sources after one `poll`.
#[derive(Clone, Copy, Debug)]
struct Readiness {
    inbound: PollFlags,
    pending: Option<PollFlags>,
}

/// Runs until the downloader reports the end of phase one.
///
/// The wait blocks indefinitely when the uploader has nothing left to send
/// or is waiting on its pending descriptor, and otherwise only polls, so
/// the uploader keeps pushing requests while the inbound stream is quiet.
pub(super) fn run_transfer_loop<R, W>(
    input: &mut Demultiplexer<R>,
    output: &mut MplexWriter<W>,
    uploader: &mut Uploader<'_>,
    downloader: &mut Downloader<'_>,
    new_dirs: &mut [bool],
) -> Result<(), ReceiverError>
where
    R: Read + AsFd,
    W: Write,
{
    loop {
        let Some(ready) = wait(input, uploader)? else {
            continue;
        };
        check(ready.inbound, "inbound stream")?;
        if let Some(pending) = ready.pending {
            check(pending, "pending upload")?;
        }

        let pending_readable = ready
            .pending
            .is_some_and(|flags| flags.contains(PollFlags::POLLIN));
        if uploader.has_work() || pending_readable {
            uploader.step(output, new_dirs)?;
        }

        if !ready.inbound.contains(PollFlags::POLLIN) {
            continue;
        }
        if input.is_multiplexed() {
            input.drain_auxiliary()?;
            if input.data_remaining() == 0 {
                trace_io!("only auxiliary frames were pending");
                continue;
            }
        }
        if downloader.step(input)? == DownloadStatus::PhaseDone {
            if uploader.has_work() {
                return Err(ReceiverError::PrematurePhaseEnd {
                    remaining: uploader.remaining(),
                });
            }
            return Ok(());
        }
    }
}

/// Waits on the inbound stream and, when present, the pending upload.
///
/// Returns `None` when the wait was interrupted by a signal.
fn wait<R: AsFd>(
    input: &Demultiplexer<R>,
    uploader: &Uploader<'_>,
) -> Result<Option<Readiness>, ReceiverError> {
    let pending = uploader.pending_fd();
    let timeout = if !uploader.has_work() || pending.is_some() {
        PollTimeout::NONE
    } else {
        PollTimeout::ZERO
    };

    let mut fds = Vec::with_capacity(2);
    fds.push(PollFd::new(input.get_ref().as_fd(), PollFlags::POLLIN));
    if let Some(fd) = pending {
        fds.push(PollFd::new(fd, PollFlags::POLLIN));
    }

    match poll(&mut fds, timeout) {
        Ok(_) => {}
        Err(Errno::EINTR) => return Ok(None),
        Err(errno) => return Err(ReceiverError::Poll(io::Error::from(errno))),
    }

    let revents = |fd: &PollFd<'_>| fd.revents().unwrap_or_else(PollFlags::empty);
    Ok(Some(Readiness {
        inbound: revents(&fds[0]),
        pending: fds.get(1).map(revents),
    }))
}

fn check(flags: PollFlags, what: &'static str) -> Result<(), ReceiverError> {
    let condition = if flags.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
        "bad fd"
    } else if flags.contains(PollFlags::POLLHUP) {
        "hangup"
    } else {
        return Ok(());
    };
    Err(ReceiverError::Descriptor { what, condition })
}
