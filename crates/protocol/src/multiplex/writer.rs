//! Outbound framing for sessions that multiplex their writes.

use std::io::{self, Write};

use super::io::send_msg;
use crate::envelope::MessageCode;

/// Largest data frame emitted on flush, matching upstream's IO buffer size.
const MAX_FRAME: usize = 32 * 1024;

/// A writer that wraps outgoing bytes in `MSG_DATA` frames.
///
/// Bytes are collected until [`flush`](Write::flush), which emits them as one
/// or more data frames. With multiplexing disabled the writer forwards every
/// write untouched.
#[derive(Debug)]
pub struct MplexWriter<W: Write> {
    inner: W,
    multiplexed: bool,
    pending: Vec<u8>,
}

impl<W: Write> MplexWriter<W> {
    /// Wraps `inner` with multiplexing disabled.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            multiplexed: false,
            pending: Vec::new(),
        }
    }

    /// Wraps `inner` with multiplexing enabled.
    pub fn multiplexed(inner: W) -> Self {
        Self {
            inner,
            multiplexed: true,
            pending: Vec::with_capacity(MAX_FRAME),
        }
    }

    /// Reports whether writes are framed.
    #[must_use]
    pub const fn is_multiplexed(&self) -> bool {
        self.multiplexed
    }

    /// Sends an out-of-band message after flushing any pending data.
    ///
    /// Without multiplexing there is no side channel, so the message is dropped.
    pub fn send_message(&mut self, code: MessageCode, payload: &[u8]) -> io::Result<()> {
        if !self.multiplexed {
            return Ok(());
        }
        self.flush_pending()?;
        send_msg(&mut self.inner, code, payload)?;
        self.inner.flush()
    }

    /// Returns a reference to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flushes pending data and unwraps the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        let Self { inner, .. } = self;
        Ok(inner)
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        for chunk in self.pending.chunks(MAX_FRAME) {
            send_msg(&mut self.inner, MessageCode::Data, chunk)?;
        }
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write> Write for MplexWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.multiplexed {
            return self.inner.write(buf);
        }
        self.pending.extend_from_slice(buf);
        if self.pending.len() >= MAX_FRAME {
            self.flush_pending()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.multiplexed {
            self.flush_pending()?;
        }
        self.inner.flush()
    }
}
