//! Group trade history.

use dashmap::DashMap;
use parking_lot::RwLock;

use groupdesk_core::{AdvisorId, BoxFuture, GroupTradeId, GroupTradeRecord};

use crate::error::StoreResult;

/// One page of history plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

pub trait GroupTradeStore: Send + Sync {
    fn insert(&self, record: GroupTradeRecord) -> BoxFuture<'_, StoreResult<GroupTradeRecord>>;

    fn find_by_id(&self, id: GroupTradeId) -> BoxFuture<'_, StoreResult<Option<GroupTradeRecord>>>;

    /// Newest first.
    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, StoreResult<Page<GroupTradeRecord>>>;
}

#[derive(Debug, Default)]
pub struct InMemoryGroupTradeStore {
    records: DashMap<GroupTradeId, GroupTradeRecord>,
    /// Insertion order per advisor.
    by_advisor: RwLock<Vec<(AdvisorId, GroupTradeId)>>,
}

impl InMemoryGroupTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl GroupTradeStore for InMemoryGroupTradeStore {
    fn insert(&self, record: GroupTradeRecord) -> BoxFuture<'_, StoreResult<GroupTradeRecord>> {
        Box::pin(async move {
            self.records.insert(record.id, record.clone());
            self.by_advisor.write().push((record.advisor_id, record.id));
            Ok(record)
        })
    }

    fn find_by_id(&self, id: GroupTradeId) -> BoxFuture<'_, StoreResult<Option<GroupTradeRecord>>> {
        Box::pin(async move { Ok(self.records.get(&id).map(|r| r.value().clone())) })
    }

    fn list_by_advisor(
        &self,
        advisor_id: AdvisorId,
        offset: usize,
        limit: usize,
    ) -> BoxFuture<'_, StoreResult<Page<GroupTradeRecord>>> {
        Box::pin(async move {
            let ids: Vec<GroupTradeId> = self
                .by_advisor
                .read()
                .iter()
                .rev()
                .filter(|(a, _)| *a == advisor_id)
                .map(|(_, id)| *id)
                .collect();
            let total = ids.len();
            let items = ids
                .into_iter()
                .skip(offset)
                .take(limit)
                .filter_map(|id| self.records.get(&id).map(|r| r.value().clone()))
                .collect();
            Ok(Page { items, total })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupdesk_core::{
        CommissionRate, GroupTradeIntent, OrderType, PerClientResult, TradeSide, UsdAmount, UserId,
    };
    use rust_decimal_macros::dec;

    fn record(advisor_id: AdvisorId, market: &str) -> GroupTradeRecord {
        let intent = GroupTradeIntent {
            market_id: market.to_string(),
            order_type: OrderType::Market,
            side: TradeSide::Long,
            size_usd: UsdAmount::from_u64(100),
            leverage: dec!(2),
            price: None,
            stop_loss: None,
            take_profit: None,
            commission_rate: CommissionRate::ZERO,
        };
        GroupTradeRecord::new(
            advisor_id,
            intent,
            vec![PerClientResult::failed(UserId::new(), "rejected")],
        )
    }

    #[tokio::test]
    async fn test_history_newest_first_with_paging() {
        let store = InMemoryGroupTradeStore::new();
        let advisor = AdvisorId::new();
        for i in 0..5 {
            store.insert(record(advisor, &format!("M{i}"))).await.unwrap();
        }
        store.insert(record(AdvisorId::new(), "OTHER")).await.unwrap();

        let page = store.list_by_advisor(advisor, 0, 2).await.unwrap();
        assert_eq!(page.total, 5);
        let markets: Vec<_> = page.items.iter().map(|r| r.intent.market_id.as_str()).collect();
        assert_eq!(markets, vec!["M4", "M3"]);

        let last = store.list_by_advisor(advisor, 4, 2).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].intent.market_id, "M0");

        let beyond = store.list_by_advisor(advisor, 10, 2).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = InMemoryGroupTradeStore::new();
        let saved = store.insert(record(AdvisorId::new(), "ETH")).await.unwrap();
        let found = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert!(store.find_by_id(GroupTradeId::new()).await.unwrap().is_none());
    }
}
