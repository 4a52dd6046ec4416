//! Group trade intents and their recorded outcomes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{CommissionRate, UsdAmount};
use crate::ids::{AdvisorId, GroupTradeId, OrderId, UserId};
use crate::order::{OrderType, TradeSide};

/// Trade shape an advisor submits once for all linked clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTradeIntent {
    pub market_id: String,
    pub order_type: OrderType,
    pub side: TradeSide,
    pub size_usd: UsdAmount,
    pub leverage: Decimal,
    #[serde(default)]
    pub price: Option<UsdAmount>,
    #[serde(default)]
    pub stop_loss: Option<UsdAmount>,
    #[serde(default)]
    pub take_profit: Option<UsdAmount>,
    pub commission_rate: CommissionRate,
}

/// Outcome of one client's order within a group trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerClientResult {
    pub client_id: UserId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerClientResult {
    pub fn succeeded(client_id: UserId, order_id: OrderId, tx_hash: String) -> Self {
        Self {
            client_id,
            success: true,
            order_id: Some(order_id),
            tx_hash: Some(tx_hash),
            error: None,
        }
    }

    /// Failure entries always carry a non-empty message.
    pub fn failed(client_id: UserId, error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "order placement failed".to_string();
        }
        Self {
            client_id,
            success: false,
            order_id: None,
            tx_hash: None,
            error: Some(error),
        }
    }
}

/// Persisted, immutable outcome of one fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTradeRecord {
    pub id: GroupTradeId,
    pub advisor_id: AdvisorId,
    pub intent: GroupTradeIntent,
    pub results: Vec<PerClientResult>,
    pub success_count: usize,
    pub total_count: usize,
    pub created_at: DateTime<Utc>,
}

impl GroupTradeRecord {
    /// Counts are derived from `results`, never supplied separately.
    pub fn new(advisor_id: AdvisorId, intent: GroupTradeIntent, results: Vec<PerClientResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let total_count = results.len();
        Self {
            id: GroupTradeId::new(),
            advisor_id,
            intent,
            results,
            success_count,
            total_count,
            created_at: Utc::now(),
        }
    }

    pub fn failure_count(&self) -> usize {
        self.total_count - self.success_count
    }
}
