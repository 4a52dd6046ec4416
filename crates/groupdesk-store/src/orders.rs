//! Order lookup.

use dashmap::DashMap;

use groupdesk_core::{BoxFuture, OrderId, OrderRecord};

use crate::error::StoreResult;

/// Read access to placed orders, used to source commission notional.
pub trait OrderLookup: Send + Sync {
    fn find_by_id(&self, order_id: OrderId) -> BoxFuture<'_, StoreResult<Option<OrderRecord>>>;
}

/// In-memory order book written by the simulated order placer.
#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    orders: DashMap<OrderId, OrderRecord>,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, order: OrderRecord) {
        self.orders.insert(order.order_id.clone(), order);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl OrderLookup for InMemoryOrderBook {
    fn find_by_id(&self, order_id: OrderId) -> BoxFuture<'_, StoreResult<Option<OrderRecord>>> {
        Box::pin(async move { Ok(self.orders.get(&order_id).map(|o| o.value().clone())) })
    }
}
