//! Multiplexed message envelope: a 4-byte little-endian header carrying a
//! message code in the top byte and a 24-bit payload length.

mod error;
mod header;
mod message_code;

pub use error::EnvelopeError;
pub use header::MessageHeader;
pub use message_code::MessageCode;

/// Size of an encoded header in bytes.
pub const HEADER_LEN: usize = 4;

/// Offset added to a message code to form the header tag byte.
pub const MPLEX_BASE: u8 = 7;

/// Largest payload length representable in the 24-bit length field.
pub const MAX_PAYLOAD_LENGTH: u32 = 0x00FF_FFFF;
