//! File list decoding for the receiver.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use super::entry::{EntryKind, FileEntry};
use super::flags::{
    MAX_PATH_LEN, XMIT_LONG_NAME, XMIT_SAME_MODE, XMIT_SAME_NAME, XMIT_SAME_TIME,
};
use super::list::FileList;
use crate::varint::{read_byte, read_int, read_longint, read_size};

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Decoder state carried between entries.
///
/// Protocol 27 compresses each entry against its predecessor: the name may
/// reuse a prefix of the previous name, and the mode and modification time may
/// be omitted when unchanged.
#[derive(Debug, Default)]
pub struct FileListReader {
    preserve_links: bool,
    prev_name: Vec<u8>,
    prev_mode: u32,
    prev_mtime: i32,
}

impl FileListReader {
    /// Creates a reader. Symlink targets are only on the wire when the session
    /// preserves links.
    #[must_use]
    pub fn new(preserve_links: bool) -> Self {
        Self {
            preserve_links,
            ..Self::default()
        }
    }

    /// Reads the next entry, or `None` at the end-of-list marker.
    pub fn read_entry<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> io::Result<Option<FileEntry>> {
        let flags = read_byte(reader)?;
        if flags == 0 {
            return Ok(None);
        }

        let shared = if flags & XMIT_SAME_NAME != 0 {
            usize::from(read_byte(reader)?)
        } else {
            0
        };
        if shared > self.prev_name.len() {
            return Err(invalid(format!(
                "file list name prefix {shared} exceeds previous name length {}",
                self.prev_name.len()
            )));
        }
        let suffix_len = if flags & XMIT_LONG_NAME != 0 {
            read_size(reader, "file name length")?
        } else {
            usize::from(read_byte(reader)?)
        };
        if shared + suffix_len > MAX_PATH_LEN {
            return Err(invalid(format!(
                "file list name length {} exceeds {MAX_PATH_LEN}",
                shared + suffix_len
            )));
        }

        let mut name = self.prev_name[..shared].to_vec();
        let start = name.len();
        name.resize(start + suffix_len, 0);
        reader.read_exact(&mut name[start..])?;

        let size = read_longint(reader)?;
        let size = u64::try_from(size)
            .map_err(|_| invalid(format!("negative file size {size} in file list")))?;
        let mtime = if flags & XMIT_SAME_TIME != 0 {
            self.prev_mtime
        } else {
            read_int(reader)?
        };
        let mode = if flags & XMIT_SAME_MODE != 0 {
            self.prev_mode
        } else {
            read_int(reader)? as u32
        };

        let path = PathBuf::from(OsStr::from_bytes(&name));
        let mut entry = FileEntry::new(path, mode, i64::from(mtime), size)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        if self.preserve_links && EntryKind::from_mode(mode) == EntryKind::Symlink {
            let len = read_size(reader, "symlink length")?;
            if len > MAX_PATH_LEN {
                return Err(invalid(format!(
                    "symlink target length {len} exceeds {MAX_PATH_LEN}"
                )));
            }
            let mut target = vec![0u8; len];
            reader.read_exact(&mut target)?;
            entry = entry.with_link_target(PathBuf::from(OsStr::from_bytes(&target)));
        }

        self.prev_name = name;
        self.prev_mode = mode;
        self.prev_mtime = mtime;
        Ok(Some(entry))
    }
}

/// Reads a complete file list up to its terminator and returns it sorted.
///
/// The trailing I/O-error status int is not consumed; callers read it
/// separately so that they can decide how to react to a non-zero value.
pub fn read_file_list<R: Read + ?Sized>(
    reader: &mut R,
    preserve_links: bool,
) -> io::Result<FileList> {
    let mut decoder = FileListReader::new(preserve_links);
    let mut entries = Vec::new();
    while let Some(entry) = decoder.read_entry(reader)? {
        tracing::trace!(
            target: "rsync::flist",
            "recv entry {}: mode {:o} size {}",
            entry.path().display(),
            entry.mode(),
            entry.size()
        );
        entries.push(entry);
    }
    Ok(FileList::from_entries(entries))
}
