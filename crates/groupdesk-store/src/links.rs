//! Client link table.

use chrono::Utc;
use parking_lot::RwLock;

use groupdesk_core::{AdvisorId, BoxFuture, ClientLink, UserId};

use crate::error::{StoreError, StoreResult};

pub trait LinkStore: Send + Sync {
    /// Insert an active link unless the client already has one.
    ///
    /// The check and the insert are a single atomic step; a concurrent
    /// second attempt for the same client gets `Conflict`.
    fn create_active(&self, link: ClientLink) -> BoxFuture<'_, StoreResult<ClientLink>>;

    fn find_active_by_client(
        &self,
        client_id: UserId,
    ) -> BoxFuture<'_, StoreResult<Option<ClientLink>>>;

    /// Close the active link between `client_id` and `advisor_id`.
    ///
    /// Fails with `NotFound` when no such active link exists.
    fn deactivate(
        &self,
        client_id: UserId,
        advisor_id: AdvisorId,
    ) -> BoxFuture<'_, StoreResult<ClientLink>>;

    /// Links for an advisor in creation order.
    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        active_only: bool,
    ) -> BoxFuture<'_, StoreResult<Vec<ClientLink>>>;
}

/// Append-only vector of link rows. Creation order is the iteration order
/// used for group-trade fan-out.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    rows: RwLock<Vec<ClientLink>>,
}

impl InMemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.rows.read().iter().filter(|l| l.is_active).count()
    }
}

impl LinkStore for InMemoryLinkStore {
    fn create_active(&self, mut link: ClientLink) -> BoxFuture<'_, StoreResult<ClientLink>> {
        Box::pin(async move {
            let mut rows = self.rows.write();
            if rows
                .iter()
                .any(|l| l.is_active && l.client_id == link.client_id)
            {
                return Err(StoreError::Conflict(format!(
                    "client {} already has an active link",
                    link.client_id
                )));
            }
            link.is_active = true;
            link.unlinked_at = None;
            rows.push(link.clone());
            Ok(link)
        })
    }

    fn find_active_by_client(
        &self,
        client_id: UserId,
    ) -> BoxFuture<'_, StoreResult<Option<ClientLink>>> {
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .iter()
                .find(|l| l.is_active && l.client_id == client_id)
                .cloned())
        })
    }

    fn deactivate(
        &self,
        client_id: UserId,
        advisor_id: AdvisorId,
    ) -> BoxFuture<'_, StoreResult<ClientLink>> {
        Box::pin(async move {
            let mut rows = self.rows.write();
            let link = rows
                .iter_mut()
                .find(|l| l.is_active && l.client_id == client_id && l.advisor_id == advisor_id)
                .ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "Active link for client {client_id} and advisor {advisor_id}"
                    ))
                })?;
            link.is_active = false;
            link.unlinked_at = Some(Utc::now());
            Ok(link.clone())
        })
    }

    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        active_only: bool,
    ) -> BoxFuture<'_, StoreResult<Vec<ClientLink>>> {
        Box::pin(async move {
            Ok(self
                .rows
                .read()
                .iter()
                .filter(|l| l.advisor_id == advisor_id && (l.is_active || !active_only))
                .cloned()
                .collect())
        })
    }
}
