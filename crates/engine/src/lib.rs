#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Receiver orchestration for rxsync.
//!
//! [`run_receiver`] drives one receiving session over an inbound and an
//! outbound stream:
//!
//! 1. receive the file list and its status;
//! 2. prepare the destination and, when asked, delete extraneous entries;
//! 3. install the filesystem sandbox;
//! 4. interleave the uploader and downloader in a `poll` loop until the
//!    sender ends phase one;
//! 5. restore directory metadata children-first;
//! 6. exchange the phase and goodbye sentinels.
//!
//! The [`client`] module establishes sessions to a remote sender through a
//! remote shell or an rsync daemon, and [`serve_receiver`] runs the receiver
//! on stdin/stdout when started with `--server`.
//!
//! # Upstream Reference
//!
//! - `receiver.c:rsync_receiver()` - the orchestrated sequence
//! - `main.c:client_run()` and `main.c:do_server_recv()` - session roles
//! - `clientserver.c:start_inband_exchange()` - daemon greeting

pub mod client;
mod error;
mod handshake;
mod options;
mod receiver;
mod server;
mod session;

pub use error::{ErrorKind, ReceiverError};
pub use options::{ReceiverOptions, Role};
pub use receiver::{Milestone, Phase, ReceiverReport, run_receiver};
pub use server::serve_receiver;
pub use session::Session;
