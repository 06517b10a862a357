#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `flist` enumerates the destination tree so the receiver can find entries
//! the sender no longer has. The walker visits regular files, directories and
//! symbolic links below a root, never following links, and reports every path
//! relative to that root.
//!
//! # Design
//!
//! - [`FileListWalker`] implements [`Iterator`] and yields [`LocalEntry`]
//!   values in depth-first pre-order. Each directory's children are sorted
//!   byte-wise before they are visited, so the sequence is stable regardless
//!   of the filesystem's iteration order.
//! - [`LocalFileList`] collects a full walk. Because a directory always
//!   precedes its contents, iterating the list backwards visits children
//!   before their parents, which is the order removals need.
//! - [`WalkError`] carries the failing path and the underlying I/O error.
//!
//! # Invariants
//!
//! - The root itself is never yielded.
//! - Relative paths never contain `..` segments and never start with `/`.
//! - Traversal stops at the first error; the walker never panics.
//!
//! # Examples
//!
//! ```
//! use flist::LocalFileList;
//! use std::fs;
//! use std::path::Path;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! fs::create_dir(temp.path().join("nested"))?;
//! fs::write(temp.path().join("nested/more.txt"), b"data")?;
//! fs::write(temp.path().join("file.txt"), b"data")?;
//!
//! let list = LocalFileList::collect(temp.path())?;
//! let paths: Vec<&Path> = list.iter().map(|entry| entry.relative_path()).collect();
//! assert_eq!(
//!     paths,
//!     [Path::new("file.txt"), Path::new("nested"), Path::new("nested/more.txt")]
//! );
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod entry;
mod error;
mod file_list_walker;
mod local_list;

pub use crate::entry::LocalEntry;
pub use crate::error::{WalkError, WalkErrorKind};
pub use crate::file_list_walker::FileListWalker;
pub use crate::local_list::LocalFileList;

#[cfg(test)]
mod tests;
