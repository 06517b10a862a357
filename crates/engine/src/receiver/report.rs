//! What a completed session did, in order.

use protocol::TransferStats;

/// Progress of the transfer sub-protocol.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    /// Block-based synchronisation is running.
    #[default]
    Phase1Active,
    /// The sender ended phase one.
    Phase1Done,
    /// The phase acknowledgement was exchanged.
    Phase2Done,
}

/// Steps of the session, recorded as they complete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Milestone {
    /// File list and status received.
    ListReceived,
    /// Local tree enumerated for deletion.
    LocalListCollected,
    /// Extraneous entries removed.
    DeletionDone,
    /// Filesystem access narrowed to the destination root.
    Sandboxed,
    /// The transfer loop finished.
    TransferDone,
    /// Directory metadata restored.
    DirectoriesFixed,
    /// Phase acknowledgement received.
    PhaseAcknowledged,
    /// Sender statistics received.
    StatsReceived,
    /// Goodbye sentinel sent.
    Goodbye,
}

/// Summary returned by [`run_receiver`](crate::run_receiver).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReceiverReport {
    pub(crate) phase: Phase,
    pub(crate) milestones: Vec<Milestone>,
    pub(crate) list_len: usize,
    pub(crate) files_requested: usize,
    pub(crate) files_received: usize,
    pub(crate) entries_deleted: usize,
    pub(crate) directories_fixed: usize,
    pub(crate) stats: Option<TransferStats>,
}

impl ReceiverReport {
    pub(crate) fn reach(&mut self, milestone: Milestone) {
        self.milestones.push(milestone);
    }

    /// Phase the session ended in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Milestones in the order they were reached.
    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Whether `milestone` was reached.
    #[must_use]
    pub fn reached(&self, milestone: Milestone) -> bool {
        self.milestones.contains(&milestone)
    }

    /// Whether `first` was reached strictly before `second`.
    #[must_use]
    pub fn reached_before(&self, first: Milestone, second: Milestone) -> bool {
        let position = |wanted| self.milestones.iter().position(|&m| m == wanted);
        matches!((position(first), position(second)), (Some(a), Some(b)) if a < b)
    }

    /// Number of entries in the received file list.
    #[must_use]
    pub const fn list_len(&self) -> usize {
        self.list_len
    }

    /// Files the uploader asked the sender for.
    #[must_use]
    pub const fn files_requested(&self) -> usize {
        self.files_requested
    }

    /// Files the downloader committed.
    #[must_use]
    pub const fn files_received(&self) -> usize {
        self.files_received
    }

    /// Entries removed by the deletion pass.
    #[must_use]
    pub const fn entries_deleted(&self) -> usize {
        self.entries_deleted
    }

    /// Directories whose metadata was restored.
    #[must_use]
    pub const fn directories_fixed(&self) -> usize {
        self.directories_fixed
    }

    /// Statistics sent by the sender, top-level sessions only.
    #[must_use]
    pub const fn stats(&self) -> Option<&TransferStats> {
        self.stats.as_ref()
    }
}
