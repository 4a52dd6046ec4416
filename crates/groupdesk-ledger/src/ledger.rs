//! Commission ledger.
//!
//! Tracking is a best-effort side channel of group-trade execution: it
//! logs and counts its own failures and never returns them. Reporting and
//! settlement are ordinary fallible operations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use groupdesk_core::{
    AdvisorId, CommissionEntry, CommissionId, CommissionRate, CommissionStatus, EarningsPeriod,
    OrderId, UsdAmount, UserId,
};
use groupdesk_store::{AdvisorStore, CommissionStore, OrderLookup, StoreError, UserDirectory};
use groupdesk_telemetry::Metrics;

use crate::error::{LedgerError, LedgerResult};

/// Per-client slice of an earnings report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBreakdown {
    pub client_id: UserId,
    /// `None` when the client is no longer in the user directory.
    pub client_wallet: Option<String>,
    pub total_commissions: UsdAmount,
    pub trade_volume: UsdAmount,
    pub trade_count: usize,
    pub average_commission: UsdAmount,
}

/// Aggregated commissions for one advisor over one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsReport {
    pub advisor_id: AdvisorId,
    pub period: EarningsPeriod,
    pub from: Option<DateTime<Utc>>,
    pub to: DateTime<Utc>,
    pub total_earnings: UsdAmount,
    pub pending_earnings: UsdAmount,
    pub paid_earnings: UsdAmount,
    pub total_volume: UsdAmount,
    pub client_count: usize,
    pub trade_count: usize,
    pub average_commission: UsdAmount,
    /// Highest-earning clients first.
    pub breakdown: Vec<ClientBreakdown>,
}

pub struct CommissionLedger {
    commissions: Arc<dyn CommissionStore>,
    orders: Arc<dyn OrderLookup>,
    advisors: Arc<dyn AdvisorStore>,
    users: Arc<dyn UserDirectory>,
}

impl CommissionLedger {
    pub fn new(
        commissions: Arc<dyn CommissionStore>,
        orders: Arc<dyn OrderLookup>,
        advisors: Arc<dyn AdvisorStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            commissions,
            orders,
            advisors,
            users,
        }
    }

    /// Record the commission owed on `order_id` at `rate`.
    ///
    /// Returns the entry written, or `None` when nothing was recorded. A
    /// missing order is logged at warn and counted; it is not an error.
    pub async fn track_advisor_commission(
        &self,
        order_id: OrderId,
        advisor_id: AdvisorId,
        rate: CommissionRate,
    ) -> Option<CommissionEntry> {
        let order = match self.orders.find_by_id(order_id.clone()).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                warn!(order_id = %order_id, advisor_id = %advisor_id, "Order not found, commission skipped");
                Metrics::commission_skipped("order_not_found");
                return None;
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Order lookup failed, commission skipped");
                Metrics::commission_skipped("store_error");
                return None;
            }
        };

        let entry = CommissionEntry::pending(advisor_id, order.user_id, order_id, order.size_usd, rate);

        let entry = match self.commissions.insert(entry).await {
            Ok(entry) => entry,
            Err(e) => {
                error!(advisor_id = %advisor_id, error = %e, "Failed to persist commission");
                Metrics::commission_skipped("store_error");
                return None;
            }
        };

        if let Err(e) = self
            .advisors
            .accrue(advisor_id, entry.commission_amount, entry.trade_volume)
            .await
        {
            let reason = match &e {
                StoreError::NotFound(_) => "advisor_not_found",
                _ => "store_error",
            };
            warn!(advisor_id = %advisor_id, error = %e, reason, "Commission recorded but advisor totals not updated");
        }

        debug!(
            commission_id = %entry.id,
            advisor_id = %advisor_id,
            client_id = %entry.client_id,
            amount = %entry.commission_amount,
            volume = %entry.trade_volume,
            rate_bps = rate.bps(),
            "Commission recorded"
        );
        Metrics::commission_recorded();
        Some(entry)
    }

    /// Earnings report for `advisor_id` over `period`. Cancelled entries are excluded.
    pub async fn get_advisor_earnings(
        &self,
        advisor_id: AdvisorId,
        period: EarningsPeriod,
    ) -> LedgerResult<EarningsReport> {
        if self.advisors.find_by_id(advisor_id).await?.is_none() {
            return Err(LedgerError::AdvisorNotFound);
        }

        let to = Utc::now();
        let from = period.since(to);
        let entries: Vec<CommissionEntry> = self
            .commissions
            .list_by_advisor(advisor_id, from)
            .await?
            .into_iter()
            .filter(CommissionEntry::is_earning)
            .collect();

        let mut order: Vec<UserId> = Vec::new();
        let mut per_client: HashMap<UserId, (UsdAmount, UsdAmount, usize)> = HashMap::new();
        let mut pending_earnings = UsdAmount::ZERO;
        let mut paid_earnings = UsdAmount::ZERO;

        for entry in &entries {
            let slot = per_client.entry(entry.client_id).or_insert_with(|| {
                order.push(entry.client_id);
                (UsdAmount::ZERO, UsdAmount::ZERO, 0)
            });
            slot.0 += entry.commission_amount;
            slot.1 += entry.trade_volume;
            slot.2 += 1;
            match entry.status {
                CommissionStatus::Paid => paid_earnings += entry.commission_amount,
                _ => pending_earnings += entry.commission_amount,
            }
        }

        let mut breakdown = Vec::with_capacity(order.len());
        for client_id in order {
            let (total, volume, count) = per_client[&client_id];
            let client_wallet = match self.users.find_by_id(client_id).await {
                Ok(user) => user.map(|u| u.wallet_address.to_checksum(None)),
                Err(e) => {
                    warn!(client_id = %client_id, error = %e, "Wallet lookup failed");
                    None
                }
            };
            breakdown.push(ClientBreakdown {
                client_id,
                client_wallet,
                total_commissions: total,
                trade_volume: volume,
                trade_count: count,
                average_commission: total.average(count),
            });
        }
        // Stable sort keeps first-seen order among equal totals.
        breakdown.sort_by(|a, b| b.total_commissions.cmp(&a.total_commissions));

        let total_earnings: UsdAmount = entries.iter().map(|e| e.commission_amount).sum();
        let total_volume: UsdAmount = entries.iter().map(|e| e.trade_volume).sum();
        let trade_count = entries.len();

        Ok(EarningsReport {
            advisor_id,
            period,
            from,
            to,
            total_earnings,
            pending_earnings,
            paid_earnings,
            total_volume,
            client_count: breakdown.len(),
            trade_count,
            average_commission: total_earnings.average(trade_count),
            breakdown,
        })
    }

    /// Commission entries for an advisor since `since` (all when `None`).
    pub async fn commissions_for_advisor(
        &self,
        advisor_id: AdvisorId,
        since: Option<DateTime<Utc>>,
    ) -> LedgerResult<Vec<CommissionEntry>> {
        Ok(self.commissions.list_by_advisor(advisor_id, since).await?)
    }

    /// `pending -> paid`.
    pub async fn settle_commission(&self, id: CommissionId) -> LedgerResult<CommissionEntry> {
        self.transition(id, CommissionStatus::Paid).await
    }

    /// `pending -> cancelled`.
    pub async fn cancel_commission(&self, id: CommissionId) -> LedgerResult<CommissionEntry> {
        self.transition(id, CommissionStatus::Cancelled).await
    }

    async fn transition(
        &self,
        id: CommissionId,
        next: CommissionStatus,
    ) -> LedgerResult<CommissionEntry> {
        let entry = self
            .commissions
            .transition(id, next)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => LedgerError::CommissionNotFound,
                other => other.into(),
            })?;
        info!(commission_id = %id, status = %entry.status, "Commission status changed");
        Ok(entry)
    }
}
