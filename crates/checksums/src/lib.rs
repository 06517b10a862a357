#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Checksums for protocol 27 block matching.
//!
//! - [`RollingChecksum`]: the weak Adler-style sum sent with every block.
//! - [`block_digest`] and [`FileDigest`]: MD4 digests mixed with the session
//!   seed, for blocks and for the whole-file verification respectively.
//! - [`BlockLayout`] and [`compute_block_sums`]: how a basis file is cut into
//!   blocks and the checksum set describing it.

mod block;
mod rolling;
mod strong;

pub use block::{BLOCK_SIZE_MAX, BLOCK_SIZE_MIN, BlockLayout, BlockSum, compute_block_sums};
pub use rolling::{RollingChecksum, RollingError};
pub use strong::{FileDigest, MD4_DIGEST_LEN, block_digest};
