//! Receiving as `rsync --server` on stdin/stdout.
//!
//! # Upstream Reference
//!
//! - `main.c:do_server_recv()`

use std::fs::File;
use std::io;
use std::os::fd::AsFd;
use std::path::Path;

use crate::client::ClientError;
use crate::handshake::server_exchange;
use crate::options::{ReceiverOptions, Role};
use crate::receiver::{ReceiverReport, run_receiver};
use crate::session::Session;

/// Serves one session for a remote client over the process's stdin/stdout.
///
/// The client's stream is plain and ours is multiplexed. Duplicated
/// descriptors are used so that no standard library buffer sits between the
/// readiness wait and the data.
///
/// # Errors
///
/// A failed handshake or session.
pub fn serve_receiver(options: ReceiverOptions, root: &Path) -> Result<ReceiverReport, ClientError> {
    let mut input = duplicate(io::stdin().as_fd()).map_err(ClientError::Handshake)?;
    let mut output = duplicate(io::stdout().as_fd()).map_err(ClientError::Handshake)?;
    let negotiated = server_exchange(&mut input, &mut output)?;

    let options = ReceiverOptions {
        role: Role::Server,
        ..options
    };
    let session = Session::new(options, negotiated.seed)
        .with_remote_protocol(negotiated.remote_protocol)
        .with_multiplexed_output();
    Ok(run_receiver(&session, input, output, root)?)
}

fn duplicate(fd: std::os::fd::BorrowedFd<'_>) -> io::Result<File> {
    fd.try_clone_to_owned().map(File::from)
}
