//! crates/protocol/src/stats.rs
//!
//! End-of-session statistics record.
//!
//! Protocol 27 sends three longints after the phase handshake, from the
//! sender's perspective:
//!
//! ```text
//! total_read    : longint (bytes the sender read from the wire)
//! total_written : longint (bytes the sender wrote to the wire)
//! total_size    : longint (sum of file sizes in the list)
//! ```

use std::fmt;
use std::io::{self, Read, Write};

use crate::varint::{read_longint, write_longint};

/// Transfer statistics reported by the sender.
///
/// # Examples
///
/// ```
/// use protocol::TransferStats;
///
/// let stats = TransferStats::new(64, 4096, 10_000);
/// let mut wire = Vec::new();
/// stats.write_to(&mut wire).unwrap();
/// assert_eq!(TransferStats::read_from(&mut wire.as_slice()).unwrap(), stats);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferStats {
    /// Bytes read by the sender.
    pub total_read: u64,
    /// Bytes written by the sender.
    pub total_written: u64,
    /// Total size of all files in the list.
    pub total_size: u64,
}

impl TransferStats {
    /// Creates a record from its three counters.
    #[must_use]
    pub const fn new(total_read: u64, total_written: u64, total_size: u64) -> Self {
        Self {
            total_read,
            total_written,
            total_size,
        }
    }

    /// Decodes a record from the wire.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            total_read: read_counter(reader, "total read")?,
            total_written: read_counter(reader, "total written")?,
            total_size: read_counter(reader, "total size")?,
        })
    }

    /// Encodes the record.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        write_longint(writer, self.total_read as i64)?;
        write_longint(writer, self.total_written as i64)?;
        write_longint(writer, self.total_size as i64)
    }

    /// Ratio of total size to bytes moved, as printed by `rsync -v`.
    #[must_use]
    pub fn speedup(&self) -> f64 {
        let moved = self.total_read + self.total_written;
        if moved == 0 {
            0.0
        } else {
            self.total_size as f64 / moved as f64
        }
    }
}

fn read_counter<R: Read + ?Sized>(reader: &mut R, what: &str) -> io::Result<u64> {
    let value = read_longint(reader)?;
    u64::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative {what} in statistics: {value}"),
        )
    })
}

impl fmt::Display for TransferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sent {} bytes  received {} bytes  total size {}  speedup {:.2}",
            self.total_read,
            self.total_written,
            self.total_size,
            self.speedup()
        )
    }
}
