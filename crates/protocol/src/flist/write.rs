//! File list encoding, used by the sending side and by test peers.

use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;

use super::entry::{EntryKind, FileEntry};
use super::flags::{XMIT_LONG_NAME, XMIT_SAME_MODE, XMIT_SAME_NAME, XMIT_SAME_TIME, XMIT_TOP_DIR};
use crate::varint::{write_byte, write_int, write_longint};

/// Encoder state mirroring [`FileListReader`](super::FileListReader).
#[derive(Debug, Default)]
pub struct FileListWriter {
    preserve_links: bool,
    prev_name: Vec<u8>,
    prev_mode: u32,
    prev_mtime: i32,
}

impl FileListWriter {
    /// Creates a writer.
    #[must_use]
    pub fn new(preserve_links: bool) -> Self {
        Self {
            preserve_links,
            ..Self::default()
        }
    }

    /// Encodes one entry, compressing it against the previous one.
    pub fn write_entry<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
        entry: &FileEntry,
    ) -> io::Result<()> {
        let name = entry.path().as_os_str().as_bytes();
        let mtime = i32::try_from(entry.mtime()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("mtime {} does not fit protocol 27", entry.mtime()),
            )
        })?;

        let shared = name
            .iter()
            .zip(&self.prev_name)
            .take_while(|(a, b)| a == b)
            .count()
            .min(255);
        let suffix = &name[shared..];

        let mut flags = 0u8;
        if shared > 0 {
            flags |= XMIT_SAME_NAME;
        }
        if suffix.len() > 255 {
            flags |= XMIT_LONG_NAME;
        }
        if mtime == self.prev_mtime {
            flags |= XMIT_SAME_TIME;
        }
        if entry.mode() == self.prev_mode {
            flags |= XMIT_SAME_MODE;
        }
        if flags == 0 {
            // A zero flag byte would read as the end of the list.
            flags = if entry.is_dir() { XMIT_LONG_NAME } else { XMIT_TOP_DIR };
        }

        write_byte(writer, flags)?;
        if flags & XMIT_SAME_NAME != 0 {
            write_byte(writer, shared as u8)?;
        }
        if flags & XMIT_LONG_NAME != 0 {
            write_int(writer, suffix.len() as i32)?;
        } else {
            write_byte(writer, suffix.len() as u8)?;
        }
        writer.write_all(suffix)?;
        write_longint(writer, entry.size() as i64)?;
        if flags & XMIT_SAME_TIME == 0 {
            write_int(writer, mtime)?;
        }
        if flags & XMIT_SAME_MODE == 0 {
            write_int(writer, entry.mode() as i32)?;
        }
        if self.preserve_links && entry.kind() == EntryKind::Symlink {
            let target = entry
                .link_target()
                .map(|target| target.as_os_str().as_bytes())
                .unwrap_or_default();
            write_int(writer, target.len() as i32)?;
            writer.write_all(target)?;
        }

        self.prev_name = name.to_vec();
        self.prev_mode = entry.mode();
        self.prev_mtime = mtime;
        Ok(())
    }

    /// Writes the end-of-list marker.
    pub fn write_end<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<()> {
        write_byte(writer, 0)
    }
}
