//! Pulling through a remote shell.
//!
//! # Upstream Reference
//!
//! - `main.c:do_cmd()` - `<rsh> host <rsync-path> --server --sender ...`
//! - `main.c:client_run()` - the sender's output arrives multiplexed

use std::path::Path;
use std::process::{Child, Command, Stdio};

use logging::trace_connect;

use super::{ClientError, TransportOptions, server_args};
use crate::handshake::client_exchange;
use crate::options::ReceiverOptions;
use crate::receiver::{ReceiverReport, run_receiver};
use crate::session::Session;

pub(super) fn pull(
    host: &str,
    path: &str,
    destination: &Path,
    options: ReceiverOptions,
    transport: &TransportOptions,
) -> Result<ReceiverReport, ClientError> {
    let mut command = remote_command(transport, host, &server_args(&options, transport.verbosity, path))?;
    trace_connect!("starting {command:?}");
    let mut child = command.spawn().map_err(|source| ClientError::Spawn {
        program: transport.rsh.clone(),
        source,
    })?;

    let outcome = receive(&mut child, destination, options);
    if outcome.is_err() {
        // The remote side may still be blocked writing to us.
        let _ = child.kill();
    }
    let status = child.wait().map_err(|source| ClientError::Spawn {
        program: transport.rsh.clone(),
        source,
    })?;
    let report = outcome?;
    if !status.success() {
        return Err(ClientError::RemoteExit(status));
    }
    Ok(report)
}

fn receive(
    child: &mut Child,
    destination: &Path,
    options: ReceiverOptions,
) -> Result<ReceiverReport, ClientError> {
    let (Some(mut input), Some(mut output)) = (child.stdout.take(), child.stdin.take()) else {
        return Err(ClientError::Handshake(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "remote shell pipes unavailable",
        )));
    };
    let negotiated = client_exchange(&mut input, &mut output)?;
    let session = Session::new(options, negotiated.seed)
        .with_remote_protocol(negotiated.remote_protocol)
        .with_multiplexed_input();
    // Both pipes close when the receiver returns, letting the remote exit.
    Ok(run_receiver(&session, input, output, destination)?)
}

/// `<rsh words...> host <rsync-path> <args...>` with piped stdin and stdout.
fn remote_command(
    transport: &TransportOptions,
    host: &str,
    args: &[String],
) -> Result<Command, ClientError> {
    let mut words = transport.rsh.split_whitespace();
    let program = words
        .next()
        .ok_or_else(|| ClientError::Syntax("empty remote shell command".to_owned()))?;
    let mut command = Command::new(program);
    command
        .args(words)
        .arg(host)
        .arg(&transport.rsync_path)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    Ok(command)
}
