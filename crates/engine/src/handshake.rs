//! Protocol version and checksum seed exchange.
//!
//! # Upstream Reference
//!
//! - `compat.c:setup_protocol()` - versions are swapped, then the server
//!   sends the seed

use std::io::{self, Read, Write};

use logging::trace_proto;
use protocol::{MIN_PROTOCOL_VERSION, PROTOCOL_VERSION, read_int, write_int};

use crate::client::ClientError;

/// Result of a completed exchange.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Negotiated {
    pub(crate) remote_protocol: i32,
    pub(crate) seed: i32,
}

/// Client side: send our version, read the peer's version and the seed.
pub(crate) fn client_exchange<R, W>(input: &mut R, output: &mut W) -> Result<Negotiated, ClientError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut exchange = || -> io::Result<Negotiated> {
        write_int(output, PROTOCOL_VERSION)?;
        output.flush()?;
        let remote_protocol = read_int(input)?;
        let seed = read_int(input)?;
        Ok(Negotiated {
            remote_protocol,
            seed,
        })
    };
    let negotiated = exchange().map_err(ClientError::Handshake)?;
    check_version(negotiated.remote_protocol)?;
    trace_proto!(
        "client version {PROTOCOL_VERSION}, server version {}, seed {}",
        negotiated.remote_protocol,
        negotiated.seed
    );
    Ok(negotiated)
}

/// Server side: read the client's version, send ours and a fresh seed.
pub(crate) fn server_exchange<R, W>(input: &mut R, output: &mut W) -> Result<Negotiated, ClientError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let remote_protocol = read_int(input).map_err(ClientError::Handshake)?;
    check_version(remote_protocol)?;
    let seed = new_seed().map_err(ClientError::Handshake)?;
    let mut reply = || -> io::Result<()> {
        write_int(output, PROTOCOL_VERSION)?;
        write_int(output, seed)?;
        output.flush()
    };
    reply().map_err(ClientError::Handshake)?;
    trace_proto!("server version {PROTOCOL_VERSION}, client version {remote_protocol}, seed {seed}");
    Ok(Negotiated {
        remote_protocol,
        seed,
    })
}

pub(crate) const fn check_version(remote: i32) -> Result<(), ClientError> {
    if remote < MIN_PROTOCOL_VERSION {
        return Err(ClientError::OldProtocol {
            remote,
            local: PROTOCOL_VERSION,
        });
    }
    Ok(())
}

fn new_seed() -> io::Result<i32> {
    let mut bytes = [0u8; 4];
    getrandom::fill(&mut bytes).map_err(|error| io::Error::other(error.to_string()))?;
    Ok(i32::from_le_bytes(bytes) & i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_reads_version_and_seed() {
        let mut reply = Vec::new();
        write_int(&mut reply, 29).unwrap();
        write_int(&mut reply, 4321).unwrap();
        let mut sent = Vec::new();

        let negotiated = client_exchange(&mut reply.as_slice(), &mut sent).unwrap();
        assert_eq!(negotiated.remote_protocol, 29);
        assert_eq!(negotiated.seed, 4321);
        assert_eq!(sent, PROTOCOL_VERSION.to_le_bytes());
    }

    #[test]
    fn old_peers_are_rejected() {
        let mut reply = Vec::new();
        write_int(&mut reply, 26).unwrap();
        write_int(&mut reply, 1).unwrap();
        let err = client_exchange(&mut reply.as_slice(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ClientError::OldProtocol { remote: 26, .. }));
    }

    #[test]
    fn server_sends_version_then_seed() {
        let mut sent = Vec::new();
        let negotiated =
            server_exchange(&mut &27i32.to_le_bytes()[..], &mut sent).unwrap();
        assert_eq!(negotiated.remote_protocol, 27);
        assert_eq!(&sent[..4], &PROTOCOL_VERSION.to_le_bytes());
        assert_eq!(&sent[4..], &negotiated.seed.to_le_bytes());
        assert!(negotiated.seed >= 0);
    }

    #[test]
    fn truncated_exchange_is_a_handshake_error() {
        let err = client_exchange(&mut &[1u8, 2][..], &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ClientError::Handshake(_)));
    }
}
