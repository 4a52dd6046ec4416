//! Order-related types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::UsdAmount;
use crate::ids::{OrderId, UserId};

/// Trade direction for a perpetual position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    TakeProfit,
}

impl OrderType {
    /// Every type except `Market` needs a trigger or limit price.
    pub fn requires_price(&self) -> bool {
        !matches!(self, Self::Market)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit => write!(f, "limit"),
            Self::Stop => write!(f, "stop"),
            Self::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// Status reported by the order-placement backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted, resting or waiting for its trigger.
    Pending,
    Filled,
    Cancelled,
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// An order as stored by the order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub market_id: String,
    pub side: TradeSide,
    pub order_type: OrderType,
    /// Trade notional; the base for commission.
    pub size_usd: UsdAmount,
    pub leverage: Decimal,
    pub price: Option<UsdAmount>,
    pub status: OrderStatus,
    pub tx_hash: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_type_serde_names() {
        assert_eq!(
            serde_json::to_string(&OrderType::TakeProfit).unwrap(),
            "\"take_profit\""
        );
        let parsed: OrderType = serde_json::from_str("\"stop\"").unwrap();
        assert_eq!(parsed, OrderType::Stop);
    }

    #[test]
    fn test_order_type_requires_price() {
        assert!(!OrderType::Market.requires_price());
        assert!(OrderType::Limit.requires_price());
        assert!(OrderType::Stop.requires_price());
        assert!(OrderType::TakeProfit.requires_price());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(TradeSide::Long.opposite(), TradeSide::Short);
        assert_eq!(TradeSide::Short.to_string(), "short");
    }
}
