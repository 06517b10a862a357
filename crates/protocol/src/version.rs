//! Protocol version constants.

/// Protocol version spoken by this implementation.
pub const PROTOCOL_VERSION: i32 = 27;

/// Oldest remote protocol version accepted during the handshake.
pub const MIN_PROTOCOL_VERSION: i32 = 27;

/// Length of the truncated strong checksum sent in the first phase.
pub const CSUM_LENGTH_PHASE1: usize = 2;

/// Length of a full strong checksum.
pub const CSUM_LENGTH_PHASE2: usize = 16;
