#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Wire format of the protocol 27 session as seen by the receiving side.
//!
//! The crate is split into small modules that mirror upstream rsync's
//! building blocks:
//!
//! - [`varint`]: fixed 4-byte ints and legacy longints;
//! - envelope and multiplex: the framed stream used once a session
//!   multiplexes, with a [`Demultiplexer`] that exposes how much data payload
//!   is pending so callers can interleave readiness waits with reads;
//! - flist: the prefix-compressed file list and its ordering;
//! - [`TransferStats`]: the end-of-session statistics record;
//! - legacy: the `@RSYNCD:` lines exchanged with a daemon.
//!
//! # Examples
//!
//! Decode a one-entry file list:
//!
//! ```
//! use protocol::{FileEntry, FileListWriter, read_file_list};
//!
//! let entry = FileEntry::file("a.txt", 0o644, 1000, 3).unwrap();
//! let mut wire = Vec::new();
//! let mut writer = FileListWriter::new(false);
//! writer.write_entry(&mut wire, &entry).unwrap();
//! writer.write_end(&mut wire).unwrap();
//!
//! let list = read_file_list(&mut wire.as_slice(), false).unwrap();
//! assert_eq!(list.entries(), &[entry]);
//! ```

mod envelope;
mod flist;
mod legacy;
mod multiplex;
mod stats;
pub mod varint;
mod version;

pub use envelope::{
    EnvelopeError, HEADER_LEN as MESSAGE_HEADER_LEN, MAX_PAYLOAD_LENGTH, MPLEX_BASE, MessageCode,
    MessageHeader,
};
pub use flist::{
    EntryKind, FileEntry, FileList, FileListReader, FileListWriter, InvalidPath, MAX_PATH_LEN,
    S_IFDIR, S_IFLNK, S_IFMT, S_IFREG, XMIT_LONG_NAME, XMIT_SAME_MODE, XMIT_SAME_NAME,
    XMIT_SAME_TIME, XMIT_TOP_DIR, read_file_list, validate_relative,
};
pub use legacy::{
    DaemonLine, LEGACY_DAEMON_PREFIX, LEGACY_ERROR_PREFIX, format_daemon_greeting,
    parse_daemon_line, read_daemon_line,
};
pub use multiplex::{
    Demultiplexer, MessageHandler, MplexWriter, log_remote_message, read_header, send_msg,
};
pub use stats::TransferStats;
pub use varint::{read_int, read_longint, write_int, write_longint};
pub use version::{CSUM_LENGTH_PHASE1, CSUM_LENGTH_PHASE2, MIN_PROTOCOL_VERSION, PROTOCOL_VERSION};
