//! Commission entry persistence.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use groupdesk_core::{AdvisorId, BoxFuture, CommissionEntry, CommissionId, CommissionStatus};

use crate::error::{StoreError, StoreResult};

pub trait CommissionStore: Send + Sync {
    fn insert(&self, entry: CommissionEntry) -> BoxFuture<'_, StoreResult<CommissionEntry>>;

    fn find_by_id(&self, id: CommissionId) -> BoxFuture<'_, StoreResult<Option<CommissionEntry>>>;

    /// Entries for an advisor created at or after `since` (all when `None`),
    /// oldest first.
    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        since: Option<DateTime<Utc>>,
    ) -> BoxFuture<'_, StoreResult<Vec<CommissionEntry>>>;

    /// Move an entry to `next`, stamping `paid_at`/`cancelled_at`.
    ///
    /// Rejects any transition `CommissionStatus::can_transition_to` forbids.
    fn transition(
        &self,
        id: CommissionId,
        next: CommissionStatus,
    ) -> BoxFuture<'_, StoreResult<CommissionEntry>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCommissionStore {
    rows: RwLock<Vec<CommissionEntry>>,
}

impl InMemoryCommissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every entry, oldest first.
    pub fn all(&self) -> Vec<CommissionEntry> {
        self.rows.read().clone()
    }
}

impl CommissionStore for InMemoryCommissionStore {
    fn insert(&self, entry: CommissionEntry) -> BoxFuture<'_, StoreResult<CommissionEntry>> {
        Box::pin(async move {
            self.rows.write().push(entry.clone());
            Ok(entry)
        })
    }

    fn find_by_id(&self, id: CommissionId) -> BoxFuture<'_, StoreResult<Option<CommissionEntry>>> {
        Box::pin(async move { Ok(self.rows.read().iter().find(|e| e.id == id).cloned()) })
    }

    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        since: Option<DateTime<Utc>>,
    ) -> BoxFuture<'_, StoreResult<Vec<CommissionEntry>>> {
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .iter()
                .filter(|e| e.advisor_id == advisor_id)
                .filter(|e| since.map_or(true, |s| e.created_at >= s))
                .cloned()
                .collect())
        })
    }

    fn transition(
        &self,
        id: CommissionId,
        next: CommissionStatus,
    ) -> BoxFuture<'_, StoreResult<CommissionEntry>> {
        Box::pin(async move {
            let mut rows = self.rows.write();
            let entry = rows
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("Commission {id}")))?;
            if !entry.status.can_transition_to(next) {
                return Err(StoreError::InvalidTransition {
                    from: entry.status,
                    to: next,
                });
            }
            let now = Utc::now();
            entry.status = next;
            match next {
                CommissionStatus::Paid => entry.paid_at = Some(now),
                CommissionStatus::Cancelled => entry.cancelled_at = Some(now),
                CommissionStatus::Pending => {}
            }
            Ok(entry.clone())
        })
    }
}
