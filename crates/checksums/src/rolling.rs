//! Rolling checksum used for weak block matching (often called `rsum`).

use thiserror::Error;

/// Errors that can occur while rolling the checksum window.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RollingError {
    /// The window is empty, so there is nothing to roll.
    #[error("rolling checksum requires a non-empty window")]
    EmptyWindow,
    /// The window length exceeds what the 32-bit state can weight.
    #[error("rolling checksum window of {len} bytes exceeds 32-bit limit")]
    WindowTooLarge {
        /// Number of bytes in the window.
        len: usize,
    },
}

/// Adler-32 style weak checksum.
///
/// `s1` accumulates the byte sum and `s2` the running prefix sums. Bytes are
/// sign-extended before summing, as upstream does with its `schar` buffer, so
/// values computed here agree with what a sender compares against.
///
/// # Example
///
/// ```rust
/// use checksums::RollingChecksum;
///
/// let mut whole = RollingChecksum::new();
/// whole.update(b"bcd");
///
/// let mut rolled = RollingChecksum::new();
/// rolled.update(b"abc");
/// rolled.roll(b'a', b'd').unwrap();
/// assert_eq!(rolled.value(), whole.value());
/// ```
#[doc(alias = "rsum")]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    len: usize,
}

const fn widen(byte: u8) -> u32 {
    byte as i8 as i32 as u32
}

impl RollingChecksum {
    /// Creates a checksum with zeroed state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            s1: 0,
            s2: 0,
            len: 0,
        }
    }

    /// Checksum of a complete block.
    #[must_use]
    pub fn of(block: &[u8]) -> u32 {
        let mut sum = Self::new();
        sum.update(block);
        sum.value()
    }

    /// Number of bytes in the current window.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` before any byte was added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends bytes to the window.
    pub fn update(&mut self, chunk: &[u8]) {
        for &byte in chunk {
            self.s1 = self.s1.wrapping_add(widen(byte));
            self.s2 = self.s2.wrapping_add(self.s1);
        }
        self.len += chunk.len();
    }

    /// Slides the window by one byte.
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }
        let window = u32::try_from(self.len)
            .map_err(|_| RollingError::WindowTooLarge { len: self.len })?;
        let out = widen(outgoing);
        self.s1 = self.s1.wrapping_sub(out).wrapping_add(widen(incoming));
        self.s2 = self
            .s2
            .wrapping_sub(window.wrapping_mul(out))
            .wrapping_add(self.s1);
        Ok(())
    }

    /// The 32-bit checksum sent on the wire.
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s1 & 0xffff) | (self.s2 << 16)
    }
}
