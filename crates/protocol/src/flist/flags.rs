//! File entry flags for the protocol 27 file list.
//!
//! The values match upstream rsync's `XMIT_*` definitions in `rsync.h`; only
//! the bits a protocol 27 peer can emit are listed.

/// Entry was named on the sender's command line.
///
/// Upstream: `XMIT_TOP_DIR (1<<0)`
pub const XMIT_TOP_DIR: u8 = 1 << 0;

/// Mode is repeated from the previous entry.
///
/// Upstream: `XMIT_SAME_MODE (1<<1)`
pub const XMIT_SAME_MODE: u8 = 1 << 1;

/// Name shares a prefix with the previous entry; a prefix-length byte follows.
///
/// Upstream: `XMIT_SAME_NAME (1<<5)`
pub const XMIT_SAME_NAME: u8 = 1 << 5;

/// Name suffix length is a 4-byte int instead of a byte.
///
/// Upstream: `XMIT_LONG_NAME (1<<6)`
pub const XMIT_LONG_NAME: u8 = 1 << 6;

/// Modification time is repeated from the previous entry.
///
/// Upstream: `XMIT_SAME_TIME (1<<7)`
pub const XMIT_SAME_TIME: u8 = 1 << 7;

/// Longest path accepted from the wire, matching `PATH_MAX`.
pub const MAX_PATH_LEN: usize = 4096;
