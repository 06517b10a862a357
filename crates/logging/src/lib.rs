#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` centralises the tracing targets used across the workspace and the
//! subscriber wiring used by the `rxsync` binary.
//!
//! Library crates emit events through the `trace_*!` macros so that every
//! subsystem reports under a stable `rsync::<area>` target. Binaries convert the
//! command-line verbosity into a [`VerbosityConfig`] and call
//! [`init_tracing`] once at start-up.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let quiet = VerbosityConfig::from_verbose_level(0);
//! assert_eq!(quiet.default_directive(), "warn");
//! ```

mod config;
#[cfg(feature = "tracing")]
mod subscriber;
mod tracing_macros;

pub use config::VerbosityConfig;
#[cfg(feature = "tracing")]
pub use subscriber::{InitError, init_tracing};
