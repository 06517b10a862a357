//! A naive delta encoder for feeding the receiver in tests.
//!
//! Real senders search for matches at every byte offset. Tests only need the
//! token stream to be well formed, so this encoder compares each receiver
//! block against the source bytes at the same offset.

use std::io::{self, Write};

use checksums::{BlockLayout, BlockSum, FileDigest, RollingChecksum, block_digest};
use protocol::write_int;

const LITERAL_CHUNK: usize = 32 * 1024;

/// How a file was encoded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeltaSummary {
    /// Blocks copied from the receiver's basis.
    pub matched_blocks: usize,
    /// Bytes sent as literal data.
    pub literal_bytes: usize,
}

/// Writes the token stream and trailing file checksum for `source`.
///
/// `sums` are the receiver's block checksums, truncated to `csum_len` bytes.
pub fn write_delta<W: Write + ?Sized>(
    out: &mut W,
    source: &[u8],
    layout: BlockLayout,
    sums: &[BlockSum],
    csum_len: usize,
    seed: i32,
) -> io::Result<DeltaSummary> {
    let mut summary = DeltaSummary::default();
    let mut offset = 0usize;

    for (index, sum) in (0..layout.count()).zip(sums) {
        if offset >= source.len() {
            break;
        }
        let len = layout.len_of(index) as usize;
        let end = (offset + len).min(source.len());
        let chunk = &source[offset..end];
        let matches = chunk.len() == len
            && RollingChecksum::of(chunk) == sum.rolling
            && block_digest(chunk, seed)[..csum_len] == sum.strong[..csum_len];
        if matches {
            write_int(out, -(index as i32) - 1)?;
            summary.matched_blocks += 1;
        } else {
            write_literal(out, chunk)?;
            summary.literal_bytes += chunk.len();
        }
        offset = end;
    }

    if offset < source.len() {
        write_literal(out, &source[offset..])?;
        summary.literal_bytes += source.len() - offset;
    }

    write_int(out, 0)?;
    let mut digest = FileDigest::new(seed);
    digest.update(source);
    out.write_all(&digest.finalize())?;
    Ok(summary)
}

fn write_literal<W: Write + ?Sized>(out: &mut W, data: &[u8]) -> io::Result<()> {
    for chunk in data.chunks(LITERAL_CHUNK) {
        write_int(out, chunk.len() as i32)?;
        out.write_all(chunk)?;
    }
    Ok(())
}
