use std::io::{self, Read, Write};

use super::{LEGACY_DAEMON_PREFIX, LEGACY_ERROR_PREFIX, MAX_LINE_LEN};

/// A classified line received from a daemon before the binary session starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DaemonLine<'a> {
    /// `@RSYNCD: OK`: the module accepted the connection.
    Ok,
    /// `@RSYNCD: EXIT`: the daemon closed the session.
    Exit,
    /// `@RSYNCD: <major>[.<minor>]`: the daemon's protocol version.
    Version {
        /// Major protocol number.
        protocol: u32,
        /// Optional fractional component.
        subprotocol: Option<u32>,
    },
    /// `@ERROR...`: a fatal error, carrying the text after the prefix.
    Error(&'a str),
    /// Any other line: message of the day.
    Motd(&'a str),
}

/// Classifies one line with its trailing newline already removed.
///
/// An `@RSYNCD:` line whose payload is not a version is treated as MOTD text.
#[must_use]
pub fn parse_daemon_line(line: &str) -> DaemonLine<'_> {
    if let Some(rest) = line.strip_prefix(LEGACY_ERROR_PREFIX) {
        return DaemonLine::Error(rest.trim_start_matches(':').trim());
    }
    let Some(rest) = line.strip_prefix(LEGACY_DAEMON_PREFIX) else {
        return DaemonLine::Motd(line);
    };
    let rest = rest.trim();
    match rest {
        "OK" => DaemonLine::Ok,
        "EXIT" => DaemonLine::Exit,
        _ => parse_version(rest).unwrap_or(DaemonLine::Motd(line)),
    }
}

fn parse_version(text: &str) -> Option<DaemonLine<'static>> {
    let token = text.split_whitespace().next()?;
    let (major, minor) = match token.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (token, None),
    };
    let protocol = major.parse().ok()?;
    let subprotocol = match minor {
        Some(minor) => Some(minor.parse().ok()?),
        None => None,
    };
    Some(DaemonLine::Version {
        protocol,
        subprotocol,
    })
}

/// Writes the client greeting, for example `@RSYNCD: 27\n`.
pub fn format_daemon_greeting<W: Write + ?Sized>(
    writer: &mut W,
    protocol: i32,
) -> io::Result<()> {
    writeln!(writer, "{LEGACY_DAEMON_PREFIX} {protocol}")
}

/// Reads one newline-terminated line byte by byte.
///
/// The stream switches to binary framing right after the last control line, so
/// nothing past the newline may be consumed. Carriage returns are dropped.
pub fn read_daemon_line<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            other => line.push(other),
        }
        if line.len() > MAX_LINE_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("daemon line exceeds {MAX_LINE_LEN} bytes"),
            ));
        }
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
