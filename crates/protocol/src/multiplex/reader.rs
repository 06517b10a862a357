//! Demultiplexing reader with explicit auxiliary draining.
//!
//! [`Demultiplexer`] implements [`Read`] over the data frames of a multiplexed
//! stream. Unlike a buffering reader it never pulls more bytes from the
//! underlying descriptor than the caller asks for, so readiness reported by
//! `poll` on that descriptor stays meaningful between calls. The number of
//! payload bytes still owed by the current data frame is tracked in
//! [`Demultiplexer::data_remaining`].

use std::fmt;
use std::io::{self, Read};

use super::io::read_header;
use crate::envelope::{MessageCode, MessageHeader};

/// Upper bound on a single out-of-band message payload.
const MAX_AUXILIARY_LEN: usize = 64 * 1024;

/// Callback invoked for every out-of-band message.
pub type MessageHandler = Box<dyn FnMut(MessageCode, &[u8]) + Send>;

/// Logs a peer diagnostic at a level matching its message code.
///
/// A single trailing newline is stripped, as upstream does before printing.
pub fn log_remote_message(code: MessageCode, payload: &[u8]) {
    let text = String::from_utf8_lossy(payload);
    let text = text.strip_suffix('\n').unwrap_or(&text);
    match code {
        MessageCode::ErrorXfer | MessageCode::Error | MessageCode::ErrorSocket => {
            tracing::error!(target: "rsync::remote", "{text}");
        }
        MessageCode::Warning => tracing::warn!(target: "rsync::remote", "{text}"),
        MessageCode::Info | MessageCode::Log | MessageCode::Client => {
            tracing::info!(target: "rsync::remote", "{text}");
        }
        MessageCode::Data => {}
    }
}

/// A reader that strips multiplex framing from the inbound stream.
///
/// Multiplexing starts disabled; in that mode reads pass straight through.
///
/// # Examples
///
/// ```
/// use std::io::{Cursor, Read};
/// use protocol::{Demultiplexer, MessageCode, send_msg};
///
/// let mut stream = Vec::new();
/// send_msg(&mut stream, MessageCode::Info, b"welcome\n").unwrap();
/// send_msg(&mut stream, MessageCode::Data, b"abc").unwrap();
///
/// let mut reader = Demultiplexer::multiplexed(Cursor::new(stream));
/// let mut buf = [0u8; 3];
/// reader.read_exact(&mut buf).unwrap();
/// assert_eq!(&buf, b"abc");
/// ```
pub struct Demultiplexer<R> {
    inner: R,
    multiplexed: bool,
    remaining: usize,
    handler: Option<MessageHandler>,
}

impl<R> Demultiplexer<R> {
    /// Wraps `inner` with multiplexing disabled.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            multiplexed: false,
            remaining: 0,
            handler: None,
        }
    }

    /// Wraps `inner` with multiplexing enabled.
    pub fn multiplexed(inner: R) -> Self {
        let mut reader = Self::new(inner);
        reader.multiplexed = true;
        reader
    }

    /// Reports whether frame parsing is active.
    #[must_use]
    pub const fn is_multiplexed(&self) -> bool {
        self.multiplexed
    }

    /// Installs a handler for out-of-band messages, replacing the default logger.
    pub fn set_message_handler<F>(&mut self, handler: F)
    where
        F: FnMut(MessageCode, &[u8]) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Payload bytes still owed by the current data frame.
    #[must_use]
    pub const fn data_remaining(&self) -> usize {
        self.remaining
    }

    /// Returns a reference to the underlying reader.
    pub const fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a mutable reference to the underlying reader.
    ///
    /// Reading from it directly desynchronises the frame tracking.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwraps the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn dispatch(&mut self, code: MessageCode, payload: &[u8]) {
        match self.handler.as_mut() {
            Some(handler) => handler(code, payload),
            None => log_remote_message(code, payload),
        }
    }
}

impl<R: Read> Demultiplexer<R> {
    /// Consumes at most one frame header when no data frame is in progress.
    ///
    /// A data header only records how many payload bytes follow. Any other
    /// message is read in full and handed to the message handler. Afterwards
    /// [`data_remaining`](Self::data_remaining) tells the caller whether
    /// application payload is ready to be consumed. Hitting the end of the
    /// stream here is an error, because the caller only drains after the
    /// descriptor reported readable.
    pub fn drain_auxiliary(&mut self) -> io::Result<()> {
        if !self.multiplexed || self.remaining > 0 {
            return Ok(());
        }
        let header = read_header(&mut self.inner)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed while waiting for a multiplexed frame",
            )
        })?;
        self.accept(header)
    }

    fn accept(&mut self, header: MessageHeader) -> io::Result<()> {
        let len = header.payload_len();
        if header.code() == MessageCode::Data {
            self.remaining = len;
            return Ok(());
        }
        if len > MAX_AUXILIARY_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} payload of {len} bytes exceeds {MAX_AUXILIARY_LEN}", header.code()),
            ));
        }
        let mut payload = vec![0u8; len];
        self.inner.read_exact(&mut payload)?;
        self.dispatch(header.code(), &payload);
        Ok(())
    }
}

impl<R: Read> Read for Demultiplexer<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.multiplexed {
            return self.inner.read(buf);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        while self.remaining == 0 {
            match read_header(&mut self.inner)? {
                Some(header) => self.accept(header)?,
                None => return Ok(0),
            }
        }
        let want = buf.len().min(self.remaining);
        let read = self.inner.read(&mut buf[..want])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "multiplexed payload truncated: {} bytes still expected",
                    self.remaining
                ),
            ));
        }
        self.remaining -= read;
        Ok(read)
    }
}

impl<R> fmt::Debug for Demultiplexer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Demultiplexer")
            .field("multiplexed", &self.multiplexed)
            .field("remaining", &self.remaining)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}
