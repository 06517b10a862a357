//! Block layout and per-block checksum sets.

use std::io::{self, Read};

use crate::rolling::RollingChecksum;
use crate::strong::{MD4_DIGEST_LEN, block_digest};

/// Smallest block length, used for every file under `BLOCK_SIZE_MIN²` bytes.
pub const BLOCK_SIZE_MIN: u32 = 700;

/// Largest block length ever chosen.
pub const BLOCK_SIZE_MAX: u32 = 1 << 17;

/// How a file of a given size is cut into blocks.
///
/// # Example
///
/// ```rust
/// use checksums::BlockLayout;
///
/// let layout = BlockLayout::for_size(1500);
/// assert_eq!(layout.block_len(), 700);
/// assert_eq!(layout.count(), 3);
/// assert_eq!(layout.remainder(), 100);
/// assert_eq!(layout.len_of(2), 100);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BlockLayout {
    block_len: u32,
    count: u32,
    remainder: u32,
}

impl BlockLayout {
    /// Chooses a layout for a file of `size` bytes.
    ///
    /// Small files use [`BLOCK_SIZE_MIN`]. Larger files use the square root of
    /// the size rounded up to a multiple of eight, capped at [`BLOCK_SIZE_MAX`].
    #[must_use]
    pub fn for_size(size: u64) -> Self {
        if size == 0 {
            return Self::default();
        }
        let min = u64::from(BLOCK_SIZE_MIN);
        let block_len = if size < min * min {
            min
        } else {
            let root = size.isqrt();
            root.div_ceil(8).saturating_mul(8).min(u64::from(BLOCK_SIZE_MAX))
        };
        Self {
            block_len: block_len as u32,
            count: size.div_ceil(block_len) as u32,
            remainder: (size % block_len) as u32,
        }
    }

    /// Rebuilds a layout from the values carried in a sum header.
    #[must_use]
    pub const fn from_parts(block_len: u32, count: u32, remainder: u32) -> Self {
        Self {
            block_len,
            count,
            remainder,
        }
    }

    /// Nominal block length.
    #[must_use]
    pub const fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Number of blocks.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Length of a short final block, or zero when the last block is full.
    #[must_use]
    pub const fn remainder(&self) -> u32 {
        self.remainder
    }

    /// Length of block `index`.
    #[must_use]
    pub const fn len_of(&self, index: u32) -> u32 {
        if index + 1 == self.count && self.remainder != 0 {
            self.remainder
        } else {
            self.block_len
        }
    }

    /// Byte offset of block `index`.
    #[must_use]
    pub const fn offset_of(&self, index: u32) -> u64 {
        index as u64 * self.block_len as u64
    }
}

/// Checksums of one block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockSum {
    /// Weak rolling checksum.
    pub rolling: u32,
    /// Strong checksum, full length; only a prefix goes on the wire.
    pub strong: [u8; MD4_DIGEST_LEN],
}

/// Reads `layout.count()` blocks from `reader` and checksums each.
///
/// The reader must yield at least as many bytes as the layout describes;
/// a short read is reported as [`io::ErrorKind::UnexpectedEof`].
pub fn compute_block_sums<R: Read + ?Sized>(
    reader: &mut R,
    layout: BlockLayout,
    seed: i32,
) -> io::Result<Vec<BlockSum>> {
    let mut sums = Vec::with_capacity(layout.count() as usize);
    let mut buffer = vec![0u8; layout.block_len() as usize];
    for index in 0..layout.count() {
        let block = &mut buffer[..layout.len_of(index) as usize];
        reader.read_exact(block)?;
        sums.push(BlockSum {
            rolling: RollingChecksum::of(block),
            strong: block_digest(block, seed),
        });
    }
    Ok(sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_file_has_no_blocks() {
        assert_eq!(BlockLayout::for_size(0), BlockLayout::default());
    }

    #[test]
    fn exact_multiple_has_no_remainder() {
        let layout = BlockLayout::for_size(1400);
        assert_eq!(layout.count(), 2);
        assert_eq!(layout.remainder(), 0);
        assert_eq!(layout.len_of(1), 700);
    }

    #[test]
    fn large_files_use_rounded_square_root() {
        let layout = BlockLayout::for_size(1_000_000);
        assert_eq!(layout.block_len(), 1000);
        assert_eq!(layout.count(), 1000);

        let layout = BlockLayout::for_size(500_001);
        // isqrt = 707, rounded up to 712
        assert_eq!(layout.block_len(), 712);
        assert_eq!(layout.block_len() % 8, 0);
    }

    #[test]
    fn huge_files_are_capped() {
        let layout = BlockLayout::for_size(1 << 40);
        assert_eq!(layout.block_len(), BLOCK_SIZE_MAX);
    }

    #[test]
    fn offsets_follow_block_len() {
        let layout = BlockLayout::for_size(2000);
        assert_eq!(layout.offset_of(2), 1400);
        assert_eq!(layout.len_of(2), 600);
    }

    #[test]
    fn sums_cover_each_block() {
        let data: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        let layout = BlockLayout::for_size(data.len() as u64);
        let sums = compute_block_sums(&mut Cursor::new(&data), layout, 3).unwrap();
        assert_eq!(sums.len(), 3);
        assert_eq!(sums[2].rolling, RollingChecksum::of(&data[1400..]));
        assert_eq!(sums[0].strong, block_digest(&data[..700], 3));
    }

    #[test]
    fn short_reader_is_an_error() {
        let layout = BlockLayout::for_size(1000);
        let err = compute_block_sums(&mut Cursor::new(vec![0u8; 10]), layout, 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
