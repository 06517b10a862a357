use std::io::{self, Read, Write};

use crate::envelope::{HEADER_LEN, MAX_PAYLOAD_LENGTH, MessageCode, MessageHeader};

/// Sends a single framed message.
///
/// Payloads larger than the 24-bit length field are rejected with
/// [`io::ErrorKind::InvalidInput`].
pub fn send_msg<W: Write + ?Sized>(
    writer: &mut W,
    code: MessageCode,
    payload: &[u8],
) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_LENGTH)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "multiplexed payload length {} exceeds maximum {MAX_PAYLOAD_LENGTH}",
                    payload.len()
                ),
            )
        })?;
    let header = MessageHeader::new(code, len)?;
    writer.write_all(&header.encode())?;
    writer.write_all(payload)
}

/// Reads one frame header.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<MessageHeader>> {
    let mut raw = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match reader.read(&mut raw[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "multiplexed header truncated: expected {HEADER_LEN} bytes but received {filled}"
                    ),
                ));
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(Some(MessageHeader::decode(&raw)?))
}
