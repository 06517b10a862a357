#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of the `rxsync` receiver. It parses the
//! small option surface with a [`clap`](https://docs.rs/clap/) builder,
//! installs the tracing subscriber and hands the transfer to
//! [`engine::client::run_client`], or to [`engine::serve_receiver`] when
//! started as `--server` by a remote client.
//!
//! # Design
//!
//! [`run`] accepts the argument iterator together with handles for standard
//! output and error and returns the process exit status, so the binary stays a
//! one-line `main` and tests can drive the whole front-end in memory.
//!
//! # Errors
//!
//! Failures are reported as `rxsync error: ...` on the error handle. The
//! status follows upstream `errcode.h`; see [`ExitCode`].
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["rxsync", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("rxsync "));
//! ```

mod exit_code;

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};
use engine::client::{ClientError, TransportOptions, run_client};
use engine::{ReceiverOptions, ReceiverReport, Role, serve_receiver};
use logging::{VerbosityConfig, init_tracing};
use protocol::PROTOCOL_VERSION;

pub use exit_code::ExitCode;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

const HELP_TEXT: &str = concat!(
    "rxsync ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "\n",
    "Usage: rxsync [OPTIONS] SOURCE DEST\n",
    "       rxsync --server [OPTIONS] . DEST\n",
    "\n",
    "Pulls SOURCE from a remote sender into the local directory DEST.\n",
    "SOURCE is one of host:path, host::module/path or\n",
    "rsync://host[:port]/module/path.\n",
    "\n",
    "Options:\n",
    "  -v, --verbose          Increase verbosity.\n",
    "  -n, --dry-run          Show what would be transferred without changing DEST.\n",
    "  -r, --recursive        Recurse into directories.\n",
    "  -l, --links            Copy symlinks as symlinks.\n",
    "  -t, --times            Preserve modification times.\n",
    "  -p, --perms            Preserve permissions.\n",
    "      --delete           Delete extraneous files from DEST (needs -r).\n",
    "  -e, --rsh=COMMAND      Remote shell to use (default: ssh).\n",
    "      --rsync-path=PATH  Program to run on the remote host.\n",
    "      --port=PORT        Daemon port for host::module sources.\n",
    "      --server           Run as the receiving helper of a remote client.\n",
    "  -h, --help             Show this help message and exit.\n",
    "  -V, --version          Output version information and exit.\n",
);

/// The outcome of argument parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedArgs {
    /// `-h/--help` was given.
    pub show_help: bool,
    /// `-V/--version` was given.
    pub show_version: bool,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// `--server` was given.
    pub server: bool,
    /// `--sender` was given; this build cannot send.
    pub sender: bool,
    /// Receiver behaviour.
    pub options: ReceiverOptions,
    /// How to reach a remote sender.
    pub transport: TransportOptions,
    /// Positional operands.
    pub operands: Vec<OsString>,
}

fn clap_command() -> Command {
    Command::new("rxsync")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(flag("help", Some('h')))
        .arg(flag("version", Some('V')))
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(flag("dry-run", Some('n')))
        .arg(flag("recursive", Some('r')))
        .arg(flag("links", Some('l')))
        .arg(flag("times", Some('t')))
        .arg(flag("perms", Some('p')))
        .arg(flag("delete", None))
        .arg(flag("server", None))
        .arg(flag("sender", None))
        .arg(
            Arg::new("rsh")
                .long("rsh")
                .short('e')
                .value_name("COMMAND")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("rsync-path")
                .long("rsync-path")
                .value_name("PATH")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .action(ArgAction::Set)
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("operands")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

fn flag(name: &'static str, short: Option<char>) -> Arg {
    let arg = Arg::new(name).long(name).action(ArgAction::SetTrue);
    match short {
        Some(short) => arg.short(short),
        None => arg,
    }
}

/// Parses command-line arguments, program name first.
///
/// # Errors
///
/// The `clap` error for unknown options or malformed values.
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("rxsync"));
    }
    let mut matches = clap_command().try_get_matches_from(args)?;

    let server = matches.get_flag("server");
    let options = ReceiverOptions {
        dry_run: matches.get_flag("dry-run"),
        recursive: matches.get_flag("recursive"),
        delete: matches.get_flag("delete"),
        preserve_times: matches.get_flag("times"),
        preserve_perms: matches.get_flag("perms"),
        preserve_links: matches.get_flag("links"),
        role: if server { Role::Server } else { Role::Client },
    };
    let verbosity = matches.get_count("verbose");
    let defaults = TransportOptions::default();
    let transport = TransportOptions {
        rsh: matches.remove_one::<String>("rsh").unwrap_or(defaults.rsh),
        rsync_path: matches
            .remove_one::<String>("rsync-path")
            .unwrap_or(defaults.rsync_path),
        port: matches.remove_one::<u16>("port"),
        verbosity,
    };
    let operands: Vec<OsString> = matches
        .remove_many::<OsString>("operands")
        .map(Iterator::collect)
        .unwrap_or_default();

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        verbosity,
        server,
        sender: matches.get_flag("sender"),
        options,
        transport,
        operands,
    })
}

/// Runs the front-end and returns the process exit status.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let rendered = error.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            report_error(stderr, first.trim_start_matches("error: "));
            ExitCode::Syntax.as_i32()
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        let _ = stdout.write_all(HELP_TEXT.as_bytes());
        return ExitCode::Ok.as_i32();
    }
    if parsed.show_version {
        let _ = writeln!(
            stdout,
            "rxsync {}  protocol version {PROTOCOL_VERSION}",
            env!("CARGO_PKG_VERSION")
        );
        return ExitCode::Ok.as_i32();
    }

    // A second installation only happens when `run` is driven repeatedly in
    // one process; the first subscriber stays in place.
    let _ = init_tracing(VerbosityConfig::from_verbose_level(parsed.verbosity));

    match transfer(&parsed) {
        Ok(report) => {
            if !parsed.server {
                summarize(stdout, &parsed, &report);
            }
            ExitCode::Ok.as_i32()
        }
        Err(error) => {
            report_error(stderr, &error.to_string());
            ExitCode::from(&error).as_i32()
        }
    }
}

fn transfer(parsed: &ParsedArgs) -> Result<ReceiverReport, ClientError> {
    if parsed.sender {
        return Err(ClientError::Syntax(
            "--sender is not supported: this program only receives".to_owned(),
        ));
    }
    let [source, destination] = parsed.operands.as_slice() else {
        return Err(ClientError::Syntax(format!(
            "expected SOURCE and DEST, got {} operand(s)",
            parsed.operands.len()
        )));
    };
    let destination = PathBuf::from(destination);

    if parsed.server {
        if source != "." {
            return Err(ClientError::Syntax(
                "--server expects '.' before the destination".to_owned(),
            ));
        }
        return serve_receiver(parsed.options, &destination);
    }

    let source = source
        .to_str()
        .ok_or_else(|| ClientError::Syntax("source operand is not valid UTF-8".to_owned()))?;
    run_client(source, &destination, parsed.options, &parsed.transport)
}

fn summarize<Out: Write>(stdout: &mut Out, parsed: &ParsedArgs, report: &ReceiverReport) {
    if parsed.verbosity == 0 {
        return;
    }
    let _ = writeln!(
        stdout,
        "received {} of {} entries, deleted {}",
        report.files_received(),
        report.list_len(),
        report.entries_deleted()
    );
    if let Some(stats) = report.stats() {
        let _ = writeln!(stdout, "{stats}");
    }
    if parsed.options.dry_run {
        let _ = writeln!(stdout, "(dry run: nothing was changed)");
    }
}

fn report_error<Err: Write>(stderr: &mut Err, message: &str) {
    let _ = writeln!(stderr, "rxsync error: {message}");
}

/// Converts a numeric exit status into a [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_captured(args: &[&str]) -> (i32, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let status = run(args.iter().copied(), &mut stdout, &mut stderr);
        (
            status,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[test]
    fn combined_short_flags_map_to_options() {
        let parsed = parse_args(["rxsync", "-vvrtpln", "--delete", "host:src", "dest"]).unwrap();
        assert_eq!(parsed.verbosity, 2);
        assert_eq!(
            parsed.options,
            ReceiverOptions {
                dry_run: true,
                recursive: true,
                delete: true,
                preserve_times: true,
                preserve_perms: true,
                preserve_links: true,
                role: Role::Client,
            }
        );
        assert_eq!(parsed.transport.verbosity, 2);
        assert_eq!(parsed.operands, ["host:src", "dest"]);
    }

    #[test]
    fn transport_options_have_defaults() {
        let parsed = parse_args(["rxsync", "h:a", "b"]).unwrap();
        assert_eq!(parsed.transport, TransportOptions::default());

        let parsed = parse_args([
            "rxsync",
            "-e",
            "ssh -p 22",
            "--rsync-path=/usr/local/bin/rsync",
            "--port",
            "8873",
            "h::m",
            "d",
        ])
        .unwrap();
        assert_eq!(parsed.transport.rsh, "ssh -p 22");
        assert_eq!(parsed.transport.rsync_path, "/usr/local/bin/rsync");
        assert_eq!(parsed.transport.port, Some(8873));
    }

    #[test]
    fn server_mode_sets_role() {
        let parsed = parse_args(["rxsync", "--server", "-rt", ".", "dest"]).unwrap();
        assert!(parsed.server);
        assert_eq!(parsed.options.role, Role::Server);
    }

    #[test]
    fn unknown_option_is_a_syntax_error() {
        let (status, _, stderr) = run_captured(&["rxsync", "--bogus", "a", "b"]);
        assert_eq!(status, 1);
        assert!(stderr.starts_with("rxsync error: "), "{stderr}");
    }

    #[test]
    fn bad_port_is_a_syntax_error() {
        let (status, _, _) = run_captured(&["rxsync", "--port", "99999", "h::m", "d"]);
        assert_eq!(status, 1);
    }

    #[test]
    fn sender_is_rejected() {
        let (status, _, stderr) = run_captured(&["rxsync", "--server", "--sender", ".", "d"]);
        assert_eq!(status, 1);
        assert!(stderr.contains("--sender"));
    }

    #[test]
    fn operand_count_is_checked() {
        let (status, _, stderr) = run_captured(&["rxsync", "host:only"]);
        assert_eq!(status, 1);
        assert!(stderr.contains("expected SOURCE and DEST"));
    }

    #[test]
    fn local_source_is_rejected() {
        let (status, _, stderr) = run_captured(&["rxsync", "/tmp/a", "/tmp/b"]);
        assert_eq!(status, 1);
        assert!(stderr.contains("local sources are not supported"));
    }

    #[test]
    fn server_requires_dot_placeholder() {
        let (status, _, _) = run_captured(&["rxsync", "--server", "src", "dest"]);
        assert_eq!(status, 1);
    }

    #[test]
    fn help_and_version_go_to_stdout() {
        let (status, stdout, stderr) = run_captured(&["rxsync", "-h"]);
        assert_eq!(status, 0);
        assert!(stdout.contains("Usage: rxsync"));
        assert!(stderr.is_empty());

        let (status, stdout, _) = run_captured(&["rxsync", "-V"]);
        assert_eq!(status, 0);
        assert!(stdout.contains("protocol version 27"));
    }
}
