//! Seeded MD4 digests used for block and whole-file verification.

use digest::Digest;
use md4::Md4;

/// Length of an MD4 digest.
pub const MD4_DIGEST_LEN: usize = 16;

/// Strong checksum of one block: `MD4(block ‖ seed)`.
///
/// The seed is appended in little-endian order, matching the protocol 27
/// block checksum.
#[must_use]
pub fn block_digest(block: &[u8], seed: i32) -> [u8; MD4_DIGEST_LEN] {
    let mut hasher = Md4::new();
    hasher.update(block);
    hasher.update(seed.to_le_bytes());
    hasher.finalize().into()
}

/// Streaming whole-file checksum: `MD4(seed ‖ data)`.
///
/// # Example
///
/// ```rust
/// use checksums::FileDigest;
///
/// let mut streamed = FileDigest::new(7);
/// streamed.update(b"hello ");
/// streamed.update(b"world");
///
/// let mut whole = FileDigest::new(7);
/// whole.update(b"hello world");
/// assert_eq!(streamed.finalize(), whole.finalize());
/// ```
#[derive(Clone, Debug)]
pub struct FileDigest {
    hasher: Md4,
}

impl FileDigest {
    /// Starts a digest primed with the session seed.
    #[must_use]
    pub fn new(seed: i32) -> Self {
        let mut hasher = Md4::new();
        hasher.update(seed.to_le_bytes());
        Self { hasher }
    }

    /// Feeds file data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finishes the digest.
    #[must_use]
    pub fn finalize(self) -> [u8; MD4_DIGEST_LEN] {
        self.hasher.finalize().into()
    }
}
