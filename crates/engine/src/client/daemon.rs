//! Pulling from an rsync daemon.
//!
//! The daemon speaks a line-oriented greeting before switching the same
//! socket to the binary session:
//!
//! ```text
//! C: @RSYNCD: 27
//! S: @RSYNCD: 27
//! C: module
//! S: motd lines...
//! S: @RSYNCD: OK
//! C: --server\n--sender\n...\n\n
//! S: <seed>
//! ```
//!
//! # Upstream Reference
//!
//! - `clientserver.c:start_inband_exchange()`

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;

use logging::trace_connect;
use protocol::{
    DaemonLine, LEGACY_DAEMON_PREFIX, PROTOCOL_VERSION, format_daemon_greeting,
    parse_daemon_line, read_daemon_line, read_int,
};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::{ClientError, RemoteSource, TransportOptions, server_args};
use crate::handshake::check_version;
use crate::options::ReceiverOptions;
use crate::receiver::{ReceiverReport, run_receiver};
use crate::session::Session;

/// What the daemon said before accepting the module.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DaemonGreeting {
    /// Protocol version from the daemon's greeting line.
    pub remote_protocol: i32,
    /// Message-of-the-day lines, in order.
    pub motd: Vec<String>,
}

/// Runs the text exchange up to and including the server arguments.
///
/// # Errors
///
/// [`ClientError::Daemon`] when the daemon refuses the module or answers
/// with an unexpected control line, [`ClientError::Handshake`] on I/O
/// failure, and [`ClientError::OldProtocol`] for daemons older than 27.
pub fn negotiate_module<S>(
    stream: &mut S,
    module: &str,
    args: &[String],
) -> Result<DaemonGreeting, ClientError>
where
    S: Read + Write + ?Sized,
{
    format_daemon_greeting(stream, PROTOCOL_VERSION).map_err(ClientError::Handshake)?;
    stream.flush().map_err(ClientError::Handshake)?;

    let first = read_daemon_line(stream).map_err(ClientError::Handshake)?;
    let remote_protocol = match parse_daemon_line(&first) {
        DaemonLine::Version { protocol, .. } => i32::try_from(protocol).unwrap_or(i32::MAX),
        DaemonLine::Error(message) => return Err(ClientError::Daemon(message.to_owned())),
        _ => return Err(ClientError::Daemon(format!("did not see server greeting: {first}"))),
    };
    check_version(remote_protocol)?;
    trace_connect!("daemon protocol {remote_protocol}");

    writeln!(stream, "{module}").map_err(ClientError::Handshake)?;
    stream.flush().map_err(ClientError::Handshake)?;

    let mut motd = Vec::new();
    loop {
        let line = read_daemon_line(stream).map_err(ClientError::Handshake)?;
        match parse_daemon_line(&line) {
            DaemonLine::Ok => break,
            DaemonLine::Exit => {
                return Err(ClientError::Daemon(format!("module {module} closed the session")));
            }
            DaemonLine::Error(message) => return Err(ClientError::Daemon(message.to_owned())),
            DaemonLine::Version { .. } => {
                return Err(ClientError::Daemon(format!("unexpected line: {line}")));
            }
            DaemonLine::Motd(text) if text.starts_with(LEGACY_DAEMON_PREFIX) => {
                return Err(ClientError::Daemon(format!("unsupported request: {text}")));
            }
            DaemonLine::Motd(text) => {
                tracing::info!(target: "rsync::connect", "{text}");
                motd.push(text.to_owned());
            }
        }
    }

    for arg in args {
        writeln!(stream, "{arg}").map_err(ClientError::Handshake)?;
    }
    writeln!(stream).map_err(ClientError::Handshake)?;
    stream.flush().map_err(ClientError::Handshake)?;

    Ok(DaemonGreeting {
        remote_protocol,
        motd,
    })
}

pub(super) fn pull(
    source: &RemoteSource,
    destination: &Path,
    options: ReceiverOptions,
    transport: &TransportOptions,
) -> Result<ReceiverReport, ClientError> {
    let RemoteSource::Daemon {
        host, port, module, ..
    } = source
    else {
        return Err(ClientError::Syntax("not a daemon source".to_owned()));
    };
    let mut stream = connect(host, *port)?;
    let args = server_args(&options, transport.verbosity, &source.server_path());
    let greeting = negotiate_module(&mut stream, module, &args)?;
    let seed = read_int(&mut stream).map_err(ClientError::Handshake)?;

    let session = Session::new(options, seed)
        .with_remote_protocol(greeting.remote_protocol)
        .with_multiplexed_input();
    Ok(run_receiver(&session, &stream, &stream, destination)?)
}

/// Tries each resolved address in turn.
fn connect(host: &str, port: u16) -> Result<TcpStream, ClientError> {
    let target = format!("{host}:{port}");
    let addresses: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ClientError::Socket {
            action: "resolve",
            target: target.clone(),
            source,
        })?
        .collect();

    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "no addresses resolved");
    for address in addresses {
        match connect_to(address) {
            Ok(stream) => {
                trace_connect!("connected to {address}");
                return Ok(stream);
            }
            Err(error) => {
                trace_connect!("{address}: {error}");
                last_error = error;
            }
        }
    }
    Err(ClientError::Socket {
        action: "connect to",
        target,
        source: last_error,
    })
}

fn connect_to(address: SocketAddr) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))?;
    socket.connect(&SockAddr::from(address))?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::net::TcpListener;
    use std::thread;

    use protocol::write_int;

    use super::*;

    /// A duplex stream: reads from `script`, records writes.
    struct Scripted {
        script: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(script: &str) -> Self {
            Self {
                script: Cursor::new(script.as_bytes().to_vec()),
                written: Vec::new(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.script.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn args() -> Vec<String> {
        vec!["--server".into(), "--sender".into(), ".".into(), "pub".into()]
    }

    #[test]
    fn accepted_module_sends_arguments() {
        let mut stream = Scripted::new("@RSYNCD: 29.0\nWelcome\r\n\n@RSYNCD: OK\n");
        let greeting = negotiate_module(&mut stream, "pub", &args()).unwrap();

        assert_eq!(greeting.remote_protocol, 29);
        assert_eq!(greeting.motd, ["Welcome", ""]);
        assert_eq!(
            String::from_utf8(stream.written).unwrap(),
            "@RSYNCD: 27\npub\n--server\n--sender\n.\npub\n\n"
        );
    }

    #[test]
    fn error_line_refuses_module() {
        let mut stream = Scripted::new("@RSYNCD: 30\n@ERROR: Unknown module 'nope'\n");
        let err = negotiate_module(&mut stream, "nope", &args()).unwrap_err();
        match err {
            ClientError::Daemon(message) => assert_eq!(message, "Unknown module 'nope'"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exit_and_auth_requests_are_refused() {
        for script in ["@RSYNCD: 27\n@RSYNCD: EXIT\n", "@RSYNCD: 27\n@RSYNCD: AUTHREQD abc\n"] {
            let mut stream = Scripted::new(script);
            assert!(matches!(
                negotiate_module(&mut stream, "m", &args()),
                Err(ClientError::Daemon(_))
            ));
        }
    }

    #[test]
    fn missing_greeting_is_refused() {
        let mut stream = Scripted::new("SSH-2.0-OpenSSH\n");
        assert!(matches!(
            negotiate_module(&mut stream, "m", &args()),
            Err(ClientError::Daemon(_))
        ));
    }

    #[test]
    fn old_daemon_is_refused() {
        let mut stream = Scripted::new("@RSYNCD: 26\n@RSYNCD: OK\n");
        assert!(matches!(
            negotiate_module(&mut stream, "m", &args()),
            Err(ClientError::OldProtocol { remote: 26, .. })
        ));
    }

    #[test]
    fn closed_connection_is_a_handshake_error() {
        let mut stream = Scripted::new("@RSYNCD: 27\n");
        assert!(matches!(
            negotiate_module(&mut stream, "m", &args()),
            Err(ClientError::Handshake(_))
        ));
    }

    #[test]
    fn pull_reads_seed_after_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let daemon = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let greeting = read_daemon_line(&mut socket).unwrap();
            assert_eq!(greeting, "@RSYNCD: 27");
            socket.write_all(b"@RSYNCD: 27\n").unwrap();
            assert_eq!(read_daemon_line(&mut socket).unwrap(), "pub");
            socket.write_all(b"@RSYNCD: OK\n").unwrap();
            let mut args = Vec::new();
            loop {
                let line = read_daemon_line(&mut socket).unwrap();
                if line.is_empty() {
                    break;
                }
                args.push(line);
            }
            write_int(&mut socket, 1234).unwrap();
            // The client's exclusion list, then an empty file list and status.
            assert_eq!(read_int(&mut socket).unwrap(), 0);
            let mut frame = Vec::new();
            let payload = [0u8, 0, 0, 0, 0];
            frame.extend_from_slice(&(((7u32) << 24) | payload.len() as u32).to_le_bytes());
            frame.extend_from_slice(&payload);
            socket.write_all(&frame).unwrap();
            args
        });

        let source = RemoteSource::Daemon {
            host: "127.0.0.1".into(),
            port,
            module: "pub".into(),
            path: String::new(),
        };
        let dest = tempfile::tempdir().unwrap();
        let report = pull(
            &source,
            dest.path(),
            ReceiverOptions::default(),
            &TransportOptions::default(),
        )
        .unwrap();

        assert_eq!(report.list_len(), 0);
        assert_eq!(daemon.join().unwrap(), ["--server", "--sender", ".", "pub"]);
    }

    #[test]
    fn unreachable_daemon_is_a_socket_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(matches!(
            connect("127.0.0.1", port),
            Err(ClientError::Socket { .. })
        ));
    }
}
