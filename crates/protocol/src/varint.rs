//! Fixed-width integer encodings used by the protocol 27 wire format.
//!
//! Every multi-byte value is little-endian. Sizes use the legacy "longint"
//! form: values that fit in a non-negative `i32` are sent as a plain int, while
//! larger values are prefixed by the `-1` marker and carried as a full `i64`.

use std::io::{self, Read, Write};

/// Reads a single byte.
pub fn read_byte<R: Read + ?Sized>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Writes a single byte.
pub fn write_byte<W: Write + ?Sized>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

/// Writes a 32-bit integer using rsync's fixed 4-byte little-endian format.
///
/// This mirrors upstream's `write_int()` from io.c.
pub fn write_int<W: Write + ?Sized>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Reads a 32-bit integer using rsync's fixed 4-byte little-endian format.
///
/// This mirrors upstream's `read_int()` from io.c.
pub fn read_int<R: Read + ?Sized>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Reads an int that must be non-negative, such as a length or a count.
///
/// `what` names the field in the resulting `InvalidData` error.
pub fn read_size<R: Read + ?Sized>(reader: &mut R, what: &str) -> io::Result<usize> {
    let value = read_int(reader)?;
    usize::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative {what} on the wire: {value}"),
        )
    })
}

/// Writes a 64-bit integer using rsync's legacy longint format.
///
/// This mirrors upstream's `write_longint()` from io.c.
pub fn write_longint<W: Write + ?Sized>(writer: &mut W, value: i64) -> io::Result<()> {
    if (0..=0x7FFF_FFFF).contains(&value) {
        writer.write_all(&(value as i32).to_le_bytes())
    } else {
        writer.write_all(&(-1i32).to_le_bytes())?;
        writer.write_all(&value.to_le_bytes())
    }
}

/// Reads a 64-bit integer using rsync's legacy longint format.
///
/// A leading `-1` announces that the full eight-byte value follows; any other
/// value is sign-extended from 32 bits.
pub fn read_longint<R: Read + ?Sized>(reader: &mut R) -> io::Result<i64> {
    let first = read_int(reader)?;
    if first == -1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    } else {
        Ok(i64::from(first))
    }
}
