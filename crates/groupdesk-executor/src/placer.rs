//! Order placement seam.
//!
//! Provides a trait-based abstraction over the exchange's order entry so
//! the group-trade executor can be driven by:
//! - `SimulatedOrderPlacer`: the in-process backend the service runs on
//! - `MockOrderPlacer`: scripted failures and call recording for tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::keccak256;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use groupdesk_core::{
    BoxFuture, GroupTradeIntent, OrderId, OrderRecord, OrderStatus, OrderType, TradeSide,
    UsdAmount, UserId,
};
use groupdesk_store::InMemoryOrderBook;

use crate::error::{PlacementError, PlacementResult};

/// One client's order, derived from a group trade intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub client_id: UserId,
    pub market_id: String,
    pub order_type: OrderType,
    pub side: TradeSide,
    pub size_usd: UsdAmount,
    pub leverage: Decimal,
    pub price: Option<UsdAmount>,
    pub stop_loss: Option<UsdAmount>,
    pub take_profit: Option<UsdAmount>,
}

impl OrderSpec {
    /// Same trade shape, placed on `client_id`'s account.
    pub fn for_client(client_id: UserId, intent: &GroupTradeIntent) -> Self {
        Self {
            client_id,
            market_id: intent.market_id.clone(),
            order_type: intent.order_type,
            side: intent.side,
            size_usd: intent.size_usd,
            leverage: intent.leverage,
            price: intent.price,
            stop_loss: intent.stop_loss,
            take_profit: intent.take_profit,
        }
    }
}

/// Acknowledgement from the order backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub tx_hash: String,
    pub status: OrderStatus,
}

/// Places a single order. Implementations may fail per call.
pub trait OrderPlacer: Send + Sync {
    fn place_order(&self, spec: OrderSpec) -> BoxFuture<'_, PlacementResult<PlacedOrder>>;
}

// ============================================================================
// SimulatedOrderPlacer
// ============================================================================

/// Accepts every order and records it in the order book.
///
/// Market orders fill immediately; every other type rests as `pending`.
/// The transaction hash is `keccak256` over the order id and a sequence
/// number, so it is unique and looks like a real one.
#[derive(Debug)]
pub struct SimulatedOrderPlacer {
    book: Arc<InMemoryOrderBook>,
    latency: Duration,
    sequence: AtomicU64,
}

impl SimulatedOrderPlacer {
    pub fn new(book: Arc<InMemoryOrderBook>) -> Self {
        Self {
            book,
            latency: Duration::ZERO,
            sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn tx_hash(&self, order_id: &OrderId) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut preimage = order_id.as_str().as_bytes().to_vec();
        preimage.extend_from_slice(&seq.to_be_bytes());
        format!("0x{}", hex::encode(keccak256(&preimage)))
    }
}

impl OrderPlacer for SimulatedOrderPlacer {
    fn place_order(&self, spec: OrderSpec) -> BoxFuture<'_, PlacementResult<PlacedOrder>> {
        Box::pin(async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let order_id = OrderId::new();
            let tx_hash = self.tx_hash(&order_id);
            let status = match spec.order_type {
                OrderType::Market => OrderStatus::Filled,
                _ => OrderStatus::Pending,
            };

            self.book.record(OrderRecord {
                order_id: order_id.clone(),
                user_id: spec.client_id,
                market_id: spec.market_id,
                side: spec.side,
                order_type: spec.order_type,
                size_usd: spec.size_usd,
                leverage: spec.leverage,
                price: spec.price,
                status,
                tx_hash: tx_hash.clone(),
                created_at: Utc::now(),
            });

            debug!(order_id = %order_id, client_id = %spec.client_id, %status, "Simulated order placed");
            Ok(PlacedOrder {
                order_id,
                tx_hash,
                status,
            })
        })
    }
}

// ============================================================================
// MockOrderPlacer
// ============================================================================

/// Mock order placer for testing.
///
/// Successful orders are forwarded to an inner `SimulatedOrderPlacer`, so
/// they land in the order book and commissions can be computed from them.
#[derive(Debug)]
pub struct MockOrderPlacer {
    inner: SimulatedOrderPlacer,
    /// Recorded calls for verification.
    calls: parking_lot::Mutex<Vec<OrderSpec>>,
    /// Clients whose orders fail with the given error.
    failures: parking_lot::Mutex<HashMap<UserId, PlacementError>>,
    /// Clients whose orders never complete.
    hanging: parking_lot::Mutex<HashSet<UserId>>,
}

impl MockOrderPlacer {
    pub fn new(book: Arc<InMemoryOrderBook>) -> Self {
        Self {
            inner: SimulatedOrderPlacer::new(book),
            calls: parking_lot::Mutex::new(Vec::new()),
            failures: parking_lot::Mutex::new(HashMap::new()),
            hanging: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    /// Delay every successful placement by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.inner = self.inner.with_latency(latency);
        self
    }

    /// Make every order for `client_id` fail with `error`.
    pub fn fail_for(&self, client_id: UserId, error: PlacementError) {
        self.failures.lock().insert(client_id, error);
    }

    /// Make every order for `client_id` hang until cancelled.
    pub fn hang_for(&self, client_id: UserId) {
        self.hanging.lock().insert(client_id);
    }

    /// Get recorded calls.
    pub fn calls(&self) -> Vec<OrderSpec> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl OrderPlacer for MockOrderPlacer {
    fn place_order(&self, spec: OrderSpec) -> BoxFuture<'_, PlacementResult<PlacedOrder>> {
        Box::pin(async move {
            self.calls.lock().push(spec.clone());

            let failure = self.failures.lock().get(&spec.client_id).cloned();
            if let Some(error) = failure {
                return Err(error);
            }
            let hangs = self.hanging.lock().contains(&spec.client_id);
            if hangs {
                std::future::pending::<()>().await;
            }
            self.inner.place_order(spec).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupdesk_core::CommissionRate;
    use groupdesk_store::OrderLookup;
    use rust_decimal_macros::dec;

    fn intent(order_type: OrderType) -> GroupTradeIntent {
        GroupTradeIntent {
            market_id: "ETH-USD".to_string(),
            order_type,
            side: TradeSide::Long,
            size_usd: UsdAmount::from_u64(1000),
            leverage: dec!(10),
            price: Some(UsdAmount::from_u64(3000)),
            stop_loss: None,
            take_profit: None,
            commission_rate: CommissionRate::ZERO,
        }
    }

    #[tokio::test]
    async fn test_simulated_records_order() {
        let book = Arc::new(InMemoryOrderBook::new());
        let placer = SimulatedOrderPlacer::new(book.clone());
        let client = UserId::new();

        let placed = placer
            .place_order(OrderSpec::for_client(client, &intent(OrderType::Market)))
            .await
            .unwrap();
        assert_eq!(placed.status, OrderStatus::Filled);
        assert!(placed.tx_hash.starts_with("0x"));
        assert_eq!(placed.tx_hash.len(), 66);

        let stored = book.find_by_id(placed.order_id.clone()).await.unwrap().unwrap();
        assert_eq!(stored.user_id, client);
        assert_eq!(stored.size_usd, UsdAmount::from_u64(1000));
    }

    #[tokio::test]
    async fn test_simulated_limit_rests_pending_with_unique_hashes() {
        let book = Arc::new(InMemoryOrderBook::new());
        let placer = SimulatedOrderPlacer::new(book.clone());
        let spec = OrderSpec::for_client(UserId::new(), &intent(OrderType::Limit));

        let a = placer.place_order(spec.clone()).await.unwrap();
        let b = placer.place_order(spec).await.unwrap();
        assert_eq!(a.status, OrderStatus::Pending);
        assert_ne!(a.tx_hash, b.tx_hash);
        assert_eq!(book.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let book = Arc::new(InMemoryOrderBook::new());
        let mock = MockOrderPlacer::new(book.clone());
        let bad = UserId::new();
        mock.fail_for(bad, PlacementError::Rejected("insufficient margin".to_string()));

        let err = mock
            .place_order(OrderSpec::for_client(bad, &intent(OrderType::Market)))
            .await
            .unwrap_err();
        assert_eq!(err, PlacementError::Rejected("insufficient margin".to_string()));
        assert!(book.is_empty());

        mock.place_order(OrderSpec::for_client(UserId::new(), &intent(OrderType::Market)))
            .await
            .unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(book.len(), 1);
    }
}
