//! crates/logging/src/tracing_macros.rs
//! Convenience macros for rsync-specific tracing.
//!
//! Each macro forwards to the matching `tracing` macro with a fixed
//! `rsync::<area>` target, so callers need `tracing` as a direct dependency.

/// Emit a transferred-file notice (shown with `-v`).
///
/// # Example
/// ```ignore
/// trace_copy!("{}", path.display());
/// ```
#[macro_export]
macro_rules! trace_copy {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "rsync::copy", $($arg)*);
    };
}

/// Emit a deletion notice (shown with `-v`).
///
/// # Example
/// ```ignore
/// trace_del!("deleting {}", path.display());
/// ```
#[macro_export]
macro_rules! trace_del {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "rsync::delete", $($arg)*);
    };
}

/// Emit a file list trace.
///
/// # Example
/// ```ignore
/// trace_flist!("received file list: {} entries", count);
/// ```
#[macro_export]
macro_rules! trace_flist {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "rsync::flist", $($arg)*);
    };
}

/// Emit a statistics line (shown with `-v`).
///
/// # Example
/// ```ignore
/// trace_stats!("total size is {}", size);
/// ```
#[macro_export]
macro_rules! trace_stats {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "rsync::stats", $($arg)*);
    };
}

/// Emit a protocol debug trace.
///
/// # Example
/// ```ignore
/// trace_proto!("remote protocol version {}", version);
/// ```
#[macro_export]
macro_rules! trace_proto {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "rsync::protocol", $($arg)*);
    };
}

/// Emit a receiver (downloader and orchestrator) trace.
///
/// # Example
/// ```ignore
/// trace_recv!("receiving {} into {}", name, temp.display());
/// ```
#[macro_export]
macro_rules! trace_recv {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "rsync::receiver", $($arg)*);
    };
}

/// Emit a generator (uploader) trace.
///
/// # Example
/// ```ignore
/// trace_genr!("requesting {} blocks for {}", count, path);
/// ```
#[macro_export]
macro_rules! trace_genr {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "rsync::generator", $($arg)*);
    };
}

/// Emit an I/O operation trace.
///
/// # Example
/// ```ignore
/// trace_io!("poll returned {} ready descriptors", ready);
/// ```
#[macro_export]
macro_rules! trace_io {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "rsync::io", $($arg)*);
    };
}

/// Emit a connection trace.
///
/// # Example
/// ```ignore
/// trace_connect!("connecting to {}", addr);
/// ```
#[macro_export]
macro_rules! trace_connect {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "rsync::connect", $($arg)*);
    };
}
