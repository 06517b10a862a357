//! Protocol 27 file list: entries, ordering and wire codec.

mod entry;
mod flags;
mod list;
mod read;
mod write;

pub use entry::{EntryKind, FileEntry, InvalidPath, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG, validate_relative};
pub use flags::{
    MAX_PATH_LEN, XMIT_LONG_NAME, XMIT_SAME_MODE, XMIT_SAME_NAME, XMIT_SAME_TIME, XMIT_TOP_DIR,
};
pub use list::FileList;
pub use read::{FileListReader, read_file_list};
pub use write::FileListWriter;
