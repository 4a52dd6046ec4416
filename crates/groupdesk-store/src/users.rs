//! User directory.

use alloy::primitives::Address;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use groupdesk_core::{BoxFuture, User, UserId};

use crate::error::{StoreError, StoreResult};

/// Lookup and update of platform users.
pub trait UserDirectory: Send + Sync {
    fn find_by_id(&self, id: UserId) -> BoxFuture<'_, StoreResult<Option<User>>>;

    fn find_by_wallet(&self, wallet: Address) -> BoxFuture<'_, StoreResult<Option<User>>>;

    /// Replace an existing user. Fails with `NotFound` for unknown ids.
    fn update(&self, user: User) -> BoxFuture<'_, StoreResult<User>>;

    /// Add a user. Fails with `Conflict` when the wallet is already registered.
    fn insert(&self, user: User) -> BoxFuture<'_, StoreResult<User>>;
}

/// DashMap-backed user directory with a wallet index.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<UserId, User>,
    by_wallet: DashMap<Address, UserId>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_id(&self, id: UserId) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move { Ok(self.users.get(&id).map(|u| u.value().clone())) })
    }

    fn find_by_wallet(&self, wallet: Address) -> BoxFuture<'_, StoreResult<Option<User>>> {
        Box::pin(async move {
            let id = match self.by_wallet.get(&wallet) {
                Some(id) => *id,
                None => return Ok(None),
            };
            Ok(self.users.get(&id).map(|u| u.value().clone()))
        })
    }

    fn update(&self, mut user: User) -> BoxFuture<'_, StoreResult<User>> {
        Box::pin(async move {
            let mut entry = self
                .users
                .get_mut(&user.id)
                .ok_or_else(|| StoreError::NotFound(format!("User {}", user.id)))?;
            user.updated_at = Utc::now();
            *entry = user.clone();
            Ok(user)
        })
    }

    fn insert(&self, user: User) -> BoxFuture<'_, StoreResult<User>> {
        Box::pin(async move {
            match self.by_wallet.entry(user.wallet_address) {
                Entry::Occupied(_) => {
                    return Err(StoreError::Conflict(format!(
                        "wallet {} already registered",
                        user.wallet_address
                    )));
                }
                Entry::Vacant(slot) => {
                    slot.insert(user.id);
                }
            }
            self.users.insert(user.id, user.clone());
            Ok(user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupdesk_core::UserRole;

    #[tokio::test]
    async fn test_insert_and_find() {
        let dir = InMemoryUserDirectory::new();
        let user = User::new(Address::repeat_byte(1), UserRole::Trader);
        dir.insert(user.clone()).await.unwrap();

        assert_eq!(dir.find_by_id(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            dir.find_by_wallet(Address::repeat_byte(1)).await.unwrap().map(|u| u.id),
            Some(user.id)
        );
        assert!(dir.find_by_wallet(Address::repeat_byte(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_wallet_conflicts() {
        let dir = InMemoryUserDirectory::new();
        dir.insert(User::new(Address::repeat_byte(1), UserRole::Trader))
            .await
            .unwrap();
        let err = dir
            .insert(User::new(Address::repeat_byte(1), UserRole::Trader))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn test_update_role() {
        let dir = InMemoryUserDirectory::new();
        let mut user = dir
            .insert(User::new(Address::repeat_byte(3), UserRole::Trader))
            .await
            .unwrap();
        user.role = UserRole::Advisor;
        dir.update(user.clone()).await.unwrap();
        let stored = dir.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Advisor);

        let missing = User::new(Address::repeat_byte(4), UserRole::Trader);
        assert!(matches!(
            dir.update(missing).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
