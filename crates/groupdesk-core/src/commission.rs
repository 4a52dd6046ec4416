//! Commission entries and reporting periods.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{CommissionRate, UsdAmount};
use crate::error::CoreError;
use crate::ids::{AdvisorId, CommissionId, OrderId, UserId};

/// Settlement state of a commission entry.
///
/// `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, next: CommissionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid) | (Self::Pending, Self::Cancelled)
        )
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One commission accrued from one successful client order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub id: CommissionId,
    pub advisor_id: AdvisorId,
    pub client_id: UserId,
    pub order_id: OrderId,
    pub commission_amount: UsdAmount,
    pub commission_rate: CommissionRate,
    pub trade_volume: UsdAmount,
    pub status: CommissionStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl CommissionEntry {
    /// Build a pending entry; the amount is derived from volume and rate.
    pub fn pending(
        advisor_id: AdvisorId,
        client_id: UserId,
        order_id: OrderId,
        trade_volume: UsdAmount,
        commission_rate: CommissionRate,
    ) -> Self {
        Self {
            id: CommissionId::new(),
            advisor_id,
            client_id,
            order_id,
            commission_amount: commission_rate.apply(trade_volume),
            commission_rate,
            trade_volume,
            status: CommissionStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
            cancelled_at: None,
        }
    }

    /// Entries that count toward earnings.
    pub fn is_earning(&self) -> bool {
        self.status != CommissionStatus::Cancelled
    }
}

/// Reporting window for earnings queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EarningsPeriod {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl EarningsPeriod {
    /// Inclusive lower bound of the window ending at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let span = match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
            Self::Quarter => Duration::days(90),
            Self::Year => Duration::days(365),
            Self::All => return None,
        };
        Some(now - span)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
            Self::All => "all",
        }
    }
}

impl fmt::Display for EarningsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EarningsPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" | "1d" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            "90d" => Ok(Self::Quarter),
            "1y" | "365d" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(CoreError::InvalidPeriod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use CommissionStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Pending));
        assert!(Paid.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn test_pending_entry_derives_amount() {
        let entry = CommissionEntry::pending(
            AdvisorId::new(),
            UserId::new(),
            OrderId::new(),
            UsdAmount::from_u64(1000),
            CommissionRate::from_bps(3000).unwrap(),
        );
        assert_eq!(entry.commission_amount, UsdAmount::from_u64(300));
        assert_eq!(entry.status, CommissionStatus::Pending);
        assert!(entry.is_earning());
    }

    #[test]
    fn test_period_parse_and_window() {
        let now = Utc::now();
        assert_eq!("30d".parse::<EarningsPeriod>().unwrap(), EarningsPeriod::Month);
        assert_eq!(EarningsPeriod::default(), EarningsPeriod::Month);
        assert!("2w".parse::<EarningsPeriod>().is_err());
        assert_eq!(EarningsPeriod::Week.since(now), Some(now - Duration::days(7)));
        assert!(EarningsPeriod::All.since(now).is_none());
    }
}
