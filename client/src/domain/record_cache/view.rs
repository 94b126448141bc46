//! Immutable cache views handed to readers and subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::mutation::MutationKind;
use crate::domain::ports::DataAccessError;
use crate::domain::user::User;

/// Status tag of the cached list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheStatus {
    /// Nothing has been requested yet.
    #[default]
    Idle,
    /// A fetch is outstanding; the previous list is still readable.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed; the previous list is still readable.
    Error(DataAccessError),
}

/// The cached record list and its status.
///
/// The list is only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    users: Arc<[User]>,
    status: CacheStatus,
    fetched_at: Option<DateTime<Utc>>,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            users: Arc::from(Vec::new()),
            status: CacheStatus::Idle,
            fetched_at: None,
        }
    }
}

impl CacheEntry {
    /// Records in backend order.
    #[must_use]
    pub fn users(&self) -> &Arc<[User]> {
        &self.users
    }

    /// Current status tag.
    #[must_use]
    pub const fn status(&self) -> &CacheStatus {
        &self.status
    }

    /// Time of the last successful fetch.
    #[must_use]
    pub const fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub(super) fn begin_loading(&mut self) {
        self.status = CacheStatus::Loading;
    }

    pub(super) fn apply(&mut self, result: Result<Vec<User>, DataAccessError>, now: DateTime<Utc>) {
        match result {
            Ok(users) => {
                self.users = Arc::from(users);
                self.status = CacheStatus::Success;
                self.fetched_at = Some(now);
            }
            Err(error) => self.status = CacheStatus::Error(error),
        }
    }

    pub(super) fn settle_abandoned(&mut self) {
        if self.status == CacheStatus::Loading {
            self.status = if self.fetched_at.is_some() {
                CacheStatus::Success
            } else {
                CacheStatus::Idle
            };
        }
    }
}

/// Status of one mutation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationStatus {
    /// No mutation of this kind has run.
    #[default]
    Idle,
    /// At least one mutation of this kind is outstanding.
    Pending,
    /// The most recent mutation of this kind succeeded.
    Success,
    /// The most recent mutation of this kind failed.
    Error(DataAccessError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MutationSlot {
    status: MutationStatus,
    in_flight: usize,
}

/// Per-kind mutation status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationStatuses {
    create: MutationSlot,
    update: MutationSlot,
    delete: MutationSlot,
}

impl MutationStatuses {
    /// Status of `kind`.
    #[must_use]
    pub const fn get(&self, kind: MutationKind) -> &MutationStatus {
        &self.slot(kind).status
    }

    /// Whether a mutation of `kind` is outstanding.
    #[must_use]
    pub const fn is_pending(&self, kind: MutationKind) -> bool {
        self.slot(kind).in_flight > 0
    }

    pub(super) fn begin(&mut self, kind: MutationKind) {
        let slot = self.slot_mut(kind);
        slot.in_flight += 1;
        slot.status = MutationStatus::Pending;
    }

    pub(super) fn finish(&mut self, kind: MutationKind, outcome: MutationStatus) {
        let slot = self.slot_mut(kind);
        slot.in_flight = slot.in_flight.saturating_sub(1);
        if slot.in_flight == 0 {
            slot.status = outcome;
        }
    }

    const fn slot(&self, kind: MutationKind) -> &MutationSlot {
        match kind {
            MutationKind::Create => &self.create,
            MutationKind::Update => &self.update,
            MutationKind::Delete => &self.delete,
        }
    }

    const fn slot_mut(&mut self, kind: MutationKind) -> &mut MutationSlot {
        match kind {
            MutationKind::Create => &mut self.create,
            MutationKind::Update => &mut self.update,
            MutationKind::Delete => &mut self.delete,
        }
    }
}

/// Snapshot of everything the cache publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheView {
    entry: CacheEntry,
    mutations: MutationStatuses,
    covered: u64,
}

impl CacheView {
    /// The cached list and its status.
    #[must_use]
    pub const fn entry(&self) -> &CacheEntry {
        &self.entry
    }

    /// Per-kind mutation status.
    #[must_use]
    pub const fn mutations(&self) -> &MutationStatuses {
        &self.mutations
    }

    pub(super) const fn covered(&self) -> u64 {
        self.covered
    }

    pub(super) const fn entry_mut(&mut self) -> &mut CacheEntry {
        &mut self.entry
    }

    pub(super) const fn mutations_mut(&mut self) -> &mut MutationStatuses {
        &mut self.mutations
    }

    pub(super) fn cover(&mut self, ticket: u64) {
        self.covered = self.covered.max(ticket);
    }
}
