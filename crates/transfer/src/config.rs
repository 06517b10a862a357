//! Settings shared by the uploader and downloader.

/// Per-session knobs that influence how entries are materialised.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TransferConfig {
    /// Report what would happen without touching the destination.
    pub dry_run: bool,
    /// Recreate symbolic links.
    pub preserve_links: bool,
    /// Apply the sender's permission bits to files and directories.
    pub preserve_perms: bool,
    /// Apply the sender's modification times.
    pub preserve_times: bool,
    /// Checksum seed from the handshake.
    pub seed: i32,
    /// The umask in effect before the receiver cleared it.
    pub old_umask: u32,
}

impl TransferConfig {
    /// Mode for directories the uploader creates.
    #[must_use]
    pub const fn default_dir_mode(&self) -> u32 {
        0o777 & !self.old_umask
    }

    /// Mode for received files when permissions are not preserved.
    #[must_use]
    pub const fn default_file_mode(&self) -> u32 {
        0o666 & !self.old_umask
    }
}
