use super::error::EnvelopeError;
use super::message_code::MessageCode;
use super::{HEADER_LEN, MAX_PAYLOAD_LENGTH, MPLEX_BASE};

/// A decoded multiplexed message header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageHeader {
    code: MessageCode,
    payload_len: u32,
}

impl MessageHeader {
    /// Creates a header for `code` with the provided payload length.
    pub const fn new(code: MessageCode, payload_len: u32) -> Result<Self, EnvelopeError> {
        if payload_len > MAX_PAYLOAD_LENGTH {
            return Err(EnvelopeError::OversizedPayload(payload_len));
        }
        Ok(Self { code, payload_len })
    }

    /// Parses the header at the start of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let Some(encoded) = bytes.get(..HEADER_LEN) else {
            return Err(EnvelopeError::TruncatedHeader {
                actual: bytes.len(),
            });
        };
        let mut raw = [0u8; HEADER_LEN];
        raw.copy_from_slice(encoded);
        Self::from_raw(u32::from_le_bytes(raw))
    }

    /// Constructs a header from its raw 32-bit wire representation.
    pub const fn from_raw(raw: u32) -> Result<Self, EnvelopeError> {
        let tag = (raw >> 24) as u8;
        if tag < MPLEX_BASE {
            return Err(EnvelopeError::InvalidTag(tag));
        }
        let value = tag - MPLEX_BASE;
        match MessageCode::from_u8(value) {
            Some(code) => Self::new(code, raw & MAX_PAYLOAD_LENGTH),
            None => Err(EnvelopeError::UnknownMessageCode(value)),
        }
    }

    /// Encodes this header into its little-endian wire form.
    #[must_use]
    pub const fn encode(self) -> [u8; HEADER_LEN] {
        let tag = (MPLEX_BASE as u32) + (self.code as u32);
        ((tag << 24) | self.payload_len).to_le_bytes()
    }

    /// Returns the decoded message code.
    #[must_use]
    pub const fn code(self) -> MessageCode {
        self.code
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        self.payload_len as usize
    }
}
