use thiserror::Error;

use super::{HEADER_LEN, MAX_PAYLOAD_LENGTH};

/// Failures encountered while parsing or constructing multiplexed message headers.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum EnvelopeError {
    /// Fewer than [`HEADER_LEN`] bytes were provided.
    #[error("multiplexed header truncated: expected {HEADER_LEN} bytes, got {actual}")]
    TruncatedHeader {
        /// Number of bytes that were available.
        actual: usize,
    },
    /// The tag byte did not include the [`super::MPLEX_BASE`] offset.
    #[error("multiplexed header contained invalid tag byte {0}")]
    InvalidTag(u8),
    /// The encoded message code is not one this implementation understands.
    #[error("unknown multiplexed message code {0}")]
    UnknownMessageCode(u8),
    /// The payload length exceeded the 24-bit field.
    #[error("multiplexed payload length {0} exceeds maximum {MAX_PAYLOAD_LENGTH}")]
    OversizedPayload(u32),
}

impl From<EnvelopeError> for std::io::Error {
    fn from(error: EnvelopeError) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, error)
    }
}
