#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! The three workers the receiver drives during a session.
//!
//! - [`Uploader`] walks the received file list in order. It creates
//!   directories and symlinks itself and, for regular files, sends the sender
//!   a block-checksum request describing the local basis.
//! - [`Downloader`] consumes the sender's reply for one file at a time,
//!   rebuilding it into a temporary file from literal data and basis blocks,
//!   verifying the whole-file checksum and renaming it into place.
//! - [`delete_extraneous`] removes local entries the sender does not list. It
//!   runs before the sandbox exists and therefore takes a
//!   [`platform::DestinationRoot`].
//!
//! The uploader and downloader are cooperative: each call performs one unit
//! of work and returns, so the caller can interleave them with readiness
//! waits on the inbound stream.
//!
//! # Upstream Reference
//!
//! - `generator.c` - `recv_generator()` and `generate_and_send_sums()`
//! - `receiver.c` - `receive_data()` and `recv_files()`
//! - `flist.c` - `delete_in_dir()`

mod config;
mod deleter;
mod downloader;
mod error;
mod sum_head;
mod temp_guard;
mod uploader;

pub use config::TransferConfig;
pub use deleter::delete_extraneous;
pub use downloader::{DownloadStatus, Downloader, MAX_LITERAL_LEN};
pub use error::TransferError;
pub use sum_head::SumHead;
pub use uploader::Uploader;
