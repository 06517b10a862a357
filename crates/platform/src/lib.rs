#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Filesystem access for the receiving side of a session.
//!
//! The receiver touches the destination in two stages. Before any transfer
//! data is accepted it owns a [`DestinationRoot`]: a directory handle plus the
//! path it was opened from, which the deletion pass may walk and prune. The
//! root is then consumed by [`SandboxedRoot::install`], after which every
//! operation is relative to the directory handle and rejects paths that try
//! to leave it. Code that needs the sandbox cannot be called with a
//! `DestinationRoot`, so nothing can enumerate the tree after narrowing.
//!
//! [`drop_privileges`] and [`UmaskGuard`] cover the remaining process-level
//! state the receiver changes.

mod error;
mod path;
mod privileges;
mod resolve;
mod root;
mod sandbox;
mod stat;
mod umask;

pub use error::SandboxError;
pub use path::check_beneath;
pub use privileges::drop_privileges;
pub use root::DestinationRoot;
pub use sandbox::SandboxedRoot;
pub use stat::FileStat;
pub use umask::UmaskGuard;
