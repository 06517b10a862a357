use nix::sys::stat::{Mode, umask};

/// Replaces the process umask and restores the previous one on drop.
///
/// The receiver runs with a zero umask so that modes it sets explicitly are
/// applied verbatim, and derives default modes from [`previous`](Self::previous).
#[derive(Debug)]
pub struct UmaskGuard {
    previous: Mode,
}

impl UmaskGuard {
    /// Installs `mask` as the process umask.
    pub fn set(mask: u32) -> Self {
        let previous = umask(Mode::from_bits_truncate(mask as _));
        tracing::trace!(target: "rsync::receiver", "umask {:o} -> {mask:o}", previous.bits());
        Self { previous }
    }

    /// The umask in effect before the guard was installed.
    #[must_use]
    pub fn previous(&self) -> u32 {
        self.previous.bits() as u32
    }
}

impl Drop for UmaskGuard {
    fn drop(&mut self) {
        umask(self.previous);
    }
}
