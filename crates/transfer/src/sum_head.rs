//! The block-checksum header that opens every file request and reply.

use std::io::{self, Read, Write};

use checksums::{BlockLayout, MD4_DIGEST_LEN};
use protocol::{read_int, write_int};

/// `count, block length, checksum length, remainder`.
///
/// The uploader sends one after each file index; the sender echoes it back
/// in front of the delta stream. An all-zero header asks for the whole file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SumHead {
    /// Block layout of the local basis.
    pub layout: BlockLayout,
    /// Number of strong checksum bytes per block.
    pub csum_len: u32,
}

impl SumHead {
    /// Header for a basis with `layout`, truncating strong sums to `csum_len`.
    #[must_use]
    pub const fn new(layout: BlockLayout, csum_len: u32) -> Self {
        Self { layout, csum_len }
    }

    /// Writes the four header ints.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_int(writer, self.layout.count() as i32)?;
        write_int(writer, self.layout.block_len() as i32)?;
        write_int(writer, self.csum_len as i32)?;
        write_int(writer, self.layout.remainder() as i32)
    }

    /// Reads and validates a header.
    ///
    /// Negative fields, a checksum longer than MD4, or a remainder not shorter
    /// than the block length are rejected as `InvalidData`.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let count = read_field(reader, "block count")?;
        let block_len = read_field(reader, "block length")?;
        let csum_len = read_field(reader, "checksum length")?;
        let remainder = read_field(reader, "block remainder")?;

        if csum_len as usize > MD4_DIGEST_LEN {
            return Err(invalid(format!("checksum length {csum_len} exceeds {MD4_DIGEST_LEN}")));
        }
        if remainder != 0 && remainder >= block_len {
            return Err(invalid(format!(
                "block remainder {remainder} not below block length {block_len}"
            )));
        }
        if count > 0 && block_len == 0 {
            return Err(invalid(format!("{count} blocks of length zero")));
        }
        Ok(Self {
            layout: BlockLayout::from_parts(block_len, count, remainder),
            csum_len,
        })
    }
}

fn read_field<R: Read + ?Sized>(reader: &mut R, what: &str) -> io::Result<u32> {
    let value = read_int(reader)?;
    u32::try_from(value).map_err(|_| invalid(format!("negative {what} in sum header: {value}")))
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
