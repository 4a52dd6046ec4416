//! Advisor persistence.
//!
//! Counter and earnings changes are single store operations rather than
//! read-modify-write cycles in the caller, so concurrent link/unlink and
//! commission accrual never lose updates.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

use groupdesk_core::{
    Advisor, AdvisorCode, AdvisorId, BoxFuture, CommissionRate, UsdAmount, UserId,
};

use crate::error::{StoreError, StoreResult};

/// Partial update of the advisor-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisorProfileUpdate {
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub commission_rate: Option<CommissionRate>,
}

impl AdvisorProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.commission_rate.is_none()
    }
}

pub trait AdvisorStore: Send + Sync {
    /// Insert a new advisor.
    ///
    /// Fails with `Conflict` if the code is taken or the user already has an
    /// advisor record. Both checks and the insert happen atomically.
    fn insert(&self, advisor: Advisor) -> BoxFuture<'_, StoreResult<Advisor>>;

    fn find_by_id(&self, id: AdvisorId) -> BoxFuture<'_, StoreResult<Option<Advisor>>>;

    fn find_by_user(&self, user_id: UserId) -> BoxFuture<'_, StoreResult<Option<Advisor>>>;

    fn find_by_code(&self, code: AdvisorCode) -> BoxFuture<'_, StoreResult<Option<Advisor>>>;

    fn update_profile(
        &self,
        id: AdvisorId,
        update: AdvisorProfileUpdate,
    ) -> BoxFuture<'_, StoreResult<Advisor>>;

    fn set_active(&self, id: AdvisorId, active: bool) -> BoxFuture<'_, StoreResult<Advisor>>;

    /// Add `delta` to `total_clients`, saturating at zero. Returns the new count.
    fn adjust_client_count(&self, id: AdvisorId, delta: i32) -> BoxFuture<'_, StoreResult<u32>>;

    /// Add to `total_earnings` and `total_volume` in one step.
    fn accrue(
        &self,
        id: AdvisorId,
        earnings: UsdAmount,
        volume: UsdAmount,
    ) -> BoxFuture<'_, StoreResult<Advisor>>;
}

#[derive(Debug, Default)]
struct AdvisorTable {
    rows: HashMap<AdvisorId, Advisor>,
    by_code: HashMap<AdvisorCode, AdvisorId>,
    by_user: HashMap<UserId, AdvisorId>,
}

impl AdvisorTable {
    fn row_mut(&mut self, id: AdvisorId) -> StoreResult<&mut Advisor> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Advisor {id}")))
    }
}

/// In-memory advisor table. One mutex guards the row map and both unique
/// indexes so conflict checks and inserts cannot interleave.
#[derive(Debug, Default)]
pub struct InMemoryAdvisorStore {
    table: Mutex<AdvisorTable>,
}

impl InMemoryAdvisorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn find_with<F>(&self, f: F) -> Option<Advisor>
    where
        F: FnOnce(&AdvisorTable) -> Option<AdvisorId>,
    {
        let table = self.table.lock();
        f(&table).and_then(|id| table.rows.get(&id).cloned())
    }
}

impl AdvisorStore for InMemoryAdvisorStore {
    fn insert(&self, advisor: Advisor) -> BoxFuture<'_, StoreResult<Advisor>> {
        Box::pin(async move {
            let mut table = self.table.lock();
            if table.by_code.contains_key(&advisor.advisor_code) {
                return Err(StoreError::Conflict(format!(
                    "advisor code {} already in use",
                    advisor.advisor_code
                )));
            }
            if table.by_user.contains_key(&advisor.user_id) {
                return Err(StoreError::Conflict(format!(
                    "user {} already has an advisor record",
                    advisor.user_id
                )));
            }
            table.by_code.insert(advisor.advisor_code.clone(), advisor.id);
            table.by_user.insert(advisor.user_id, advisor.id);
            table.rows.insert(advisor.id, advisor.clone());
            Ok(advisor)
        })
    }

    fn find_by_id(&self, id: AdvisorId) -> BoxFuture<'_, StoreResult<Option<Advisor>>> {
        Box::pin(async move { Ok(self.find_with(|_| Some(id))) })
    }

    fn find_by_user(&self, user_id: UserId) -> BoxFuture<'_, StoreResult<Option<Advisor>>> {
        Box::pin(async move { Ok(self.find_with(|t| t.by_user.get(&user_id).copied())) })
    }

    fn find_by_code(&self, code: AdvisorCode) -> BoxFuture<'_, StoreResult<Option<Advisor>>> {
        Box::pin(async move { Ok(self.find_with(|t| t.by_code.get(&code).copied())) })
    }

    fn update_profile(
        &self,
        id: AdvisorId,
        update: AdvisorProfileUpdate,
    ) -> BoxFuture<'_, StoreResult<Advisor>> {
        Box::pin(async move {
            let mut table = self.table.lock();
            let row = table.row_mut(id)?;
            if let Some(description) = update.description {
                row.description = description;
            }
            if let Some(rate) = update.commission_rate {
                row.commission_rate = rate;
            }
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }

    fn set_active(&self, id: AdvisorId, active: bool) -> BoxFuture<'_, StoreResult<Advisor>> {
        Box::pin(async move {
            let mut table = self.table.lock();
            let row = table.row_mut(id)?;
            row.is_active = active;
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }

    fn adjust_client_count(&self, id: AdvisorId, delta: i32) -> BoxFuture<'_, StoreResult<u32>> {
        Box::pin(async move {
            let mut table = self.table.lock();
            let row = table.row_mut(id)?;
            row.total_clients = row.total_clients.saturating_add_signed(delta);
            row.updated_at = Utc::now();
            Ok(row.total_clients)
        })
    }

    fn accrue(
        &self,
        id: AdvisorId,
        earnings: UsdAmount,
        volume: UsdAmount,
    ) -> BoxFuture<'_, StoreResult<Advisor>> {
        Box::pin(async move {
            let mut table = self.table.lock();
            let row = table.row_mut(id)?;
            row.total_earnings += earnings;
            row.total_volume += volume;
            row.updated_at = Utc::now();
            Ok(row.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn advisor(code: &str) -> Advisor {
        Advisor::new(
            UserId::new(),
            AdvisorCode::parse(code).unwrap(),
            CommissionRate::from_bps(3000).unwrap(),
            None,
        )
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_code() {
        let store = InMemoryAdvisorStore::new();
        store.insert(advisor("AAAA1111")).await.unwrap();
        let err = store.insert(advisor("AAAA1111")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_rejects_second_record_for_user() {
        let store = InMemoryAdvisorStore::new();
        let first = store.insert(advisor("AAAA1111")).await.unwrap();
        let mut second = advisor("BBBB2222");
        second.user_id = first.user_id;
        assert!(matches!(
            store.insert(second).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = InMemoryAdvisorStore::new();
        let a = store.insert(advisor("CODE0001")).await.unwrap();
        let code = AdvisorCode::parse("CODE0001").unwrap();
        assert_eq!(store.find_by_code(code).await.unwrap().map(|x| x.id), Some(a.id));
        assert_eq!(store.find_by_user(a.user_id).await.unwrap().map(|x| x.id), Some(a.id));
        assert!(store.find_by_id(AdvisorId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_client_count_floors_at_zero() {
        let store = InMemoryAdvisorStore::new();
        let a = store.insert(advisor("CODE0002")).await.unwrap();
        assert_eq!(store.adjust_client_count(a.id, -1).await.unwrap(), 0);
        assert_eq!(store.adjust_client_count(a.id, 1).await.unwrap(), 1);
        assert_eq!(store.adjust_client_count(a.id, 1).await.unwrap(), 2);
        assert_eq!(store.adjust_client_count(a.id, -5).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_increments_not_lost() {
        let store = Arc::new(InMemoryAdvisorStore::new());
        let a = store.insert(advisor("CODE0003")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.adjust_client_count(a.id, 1).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let stored = store.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(stored.total_clients, 50);
    }

    #[tokio::test]
    async fn test_accrue_and_profile_update() {
        let store = InMemoryAdvisorStore::new();
        let a = store.insert(advisor("CODE0004")).await.unwrap();
        store
            .accrue(a.id, UsdAmount::from_u64(300), UsdAmount::from_u64(1000))
            .await
            .unwrap();
        let updated = store
            .accrue(a.id, UsdAmount::from_u64(30), UsdAmount::from_u64(100))
            .await
            .unwrap();
        assert_eq!(updated.total_earnings, UsdAmount::from_u64(330));
        assert_eq!(updated.total_volume, UsdAmount::from_u64(1100));

        let update = AdvisorProfileUpdate {
            description: Some(Some("macro".to_string())),
            commission_rate: Some(CommissionRate::from_bps(1500).unwrap()),
        };
        let updated = store.update_profile(a.id, update).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("macro"));
        assert_eq!(updated.commission_rate.bps(), 1500);
        assert_eq!(updated.total_earnings, UsdAmount::from_u64(330));
    }
}
