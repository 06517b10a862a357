//! Options that shape a receiving session.

/// Which side of the connection started the session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Role {
    /// The receiver is the top-level driver: it sends the preamble and reads
    /// the sender's statistics.
    #[default]
    Client,
    /// The receiver was started with `--server` by a remote client.
    Server,
}

/// Behaviour switches for one receiving session.
///
/// # Examples
///
/// ```
/// use engine::{ReceiverOptions, Role};
///
/// let options = ReceiverOptions {
///     recursive: true,
///     delete: true,
///     ..ReceiverOptions::default()
/// };
/// assert!(options.deletes());
/// assert_eq!(options.role, Role::Client);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReceiverOptions {
    /// Report what would change without touching the filesystem.
    pub dry_run: bool,
    /// The sender walks directories recursively.
    pub recursive: bool,
    /// Remove local entries the sender does not list.
    pub delete: bool,
    /// Apply remote modification times.
    pub preserve_times: bool,
    /// Apply remote permission bits.
    pub preserve_perms: bool,
    /// Recreate symbolic links.
    pub preserve_links: bool,
    /// Top-level client or embedded server.
    pub role: Role,
}

impl ReceiverOptions {
    /// Whether the deletion pass runs; it needs both `--delete` and recursion.
    #[must_use]
    pub const fn deletes(&self) -> bool {
        self.recursive && self.delete
    }

    /// Whether directory metadata is restored after the transfer.
    #[must_use]
    pub const fn fixes_directories(&self) -> bool {
        !self.dry_run && self.recursive && (self.preserve_times || self.preserve_perms)
    }

    /// Whether this receiver is the top-level driver.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        matches!(self.role, Role::Client)
    }
}
