//! Read models composed from the registry, ledger and executor.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use groupdesk_core::{
    Advisor, AdvisorId, CommissionRate, EarningsPeriod, LinkId, UsdAmount, User, UserId,
};
use groupdesk_executor::GroupTradeExecutor;
use groupdesk_ledger::CommissionLedger;
use groupdesk_registry::{AdvisorRegistry, RegistryError};
use groupdesk_store::UserDirectory;

use crate::error::{ApiError, ApiResult};

/// One row of an advisor's client list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub link_id: LinkId,
    pub client_id: UserId,
    pub wallet_address: Option<String>,
    pub email: Option<String>,
    pub linked_at: DateTime<Utc>,
    pub unlinked_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub commission_rate: CommissionRate,
    pub trade_count: usize,
    pub trade_volume: UsdAmount,
    pub total_commissions: UsdAmount,
}

/// Dashboard overview for one advisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub total_earnings: UsdAmount,
    pub total_volume: UsdAmount,
    pub earnings_30d: UsdAmount,
    pub volume_30d: UsdAmount,
    pub average_commission: UsdAmount,
    pub group_trades: usize,
    /// Successful client orders over all client orders, as a percentage.
    pub success_rate: Decimal,
}

pub struct AdvisorDesk {
    pub registry: Arc<AdvisorRegistry>,
    pub executor: Arc<GroupTradeExecutor>,
    pub ledger: Arc<CommissionLedger>,
    users: Arc<dyn UserDirectory>,
    default_period: EarningsPeriod,
}

impl AdvisorDesk {
    pub fn new(
        registry: Arc<AdvisorRegistry>,
        executor: Arc<GroupTradeExecutor>,
        ledger: Arc<CommissionLedger>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            registry,
            executor,
            ledger,
            users,
            default_period: EarningsPeriod::default(),
        }
    }

    /// Window for earnings queries that name none.
    #[must_use]
    pub fn with_default_period(mut self, period: EarningsPeriod) -> Self {
        self.default_period = period;
        self
    }

    pub fn default_period(&self) -> EarningsPeriod {
        self.default_period
    }

    /// The caller's user record. Unknown ids are unauthenticated.
    pub async fn authenticate(&self, user_id: UserId) -> ApiResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
    }

    /// The caller's advisor record. Requires the advisor role.
    pub async fn require_advisor(&self, user_id: UserId) -> ApiResult<Advisor> {
        let user = self.authenticate(user_id).await?;
        if !user.is_advisor() {
            return Err(ApiError::Forbidden("Advisor role required".to_string()));
        }
        self.registry
            .find_by_user(user_id)
            .await?
            .ok_or(ApiError::Registry(RegistryError::AdvisorNotFound))
    }

    /// Every client the advisor has had, in link order, with lifetime
    /// commission totals.
    pub async fn clients(&self, advisor_id: AdvisorId) -> ApiResult<Vec<ClientSummary>> {
        let links = self.registry.links_for_advisor(advisor_id).await?;
        let entries = self.ledger.commissions_for_advisor(advisor_id, None).await?;

        let mut per_client: HashMap<UserId, (usize, UsdAmount, UsdAmount)> = HashMap::new();
        for entry in entries.iter().filter(|e| e.is_earning()) {
            let slot = per_client
                .entry(entry.client_id)
                .or_insert((0, UsdAmount::ZERO, UsdAmount::ZERO));
            slot.0 += 1;
            slot.1 += entry.trade_volume;
            slot.2 += entry.commission_amount;
        }

        let mut clients = Vec::with_capacity(links.len());
        for link in links {
            let user = self.users.find_by_id(link.client_id).await?;
            let (trade_count, trade_volume, total_commissions) = per_client
                .get(&link.client_id)
                .copied()
                .unwrap_or((0, UsdAmount::ZERO, UsdAmount::ZERO));
            clients.push(ClientSummary {
                link_id: link.id,
                client_id: link.client_id,
                wallet_address: user.as_ref().map(|u| u.wallet_address.to_checksum(None)),
                email: user.and_then(|u| u.email),
                linked_at: link.linked_at,
                unlinked_at: link.unlinked_at,
                is_active: link.is_active,
                commission_rate: link.commission_rate,
                trade_count,
                trade_volume,
                total_commissions,
            });
        }
        Ok(clients)
    }

    pub async fn stats(&self, advisor: &Advisor) -> ApiResult<AdvisorStats> {
        let links = self.registry.links_for_advisor(advisor.id).await?;
        let active_clients = links.iter().filter(|l| l.is_active).count();
        let month = self
            .ledger
            .get_advisor_earnings(advisor.id, EarningsPeriod::Month)
            .await?;
        let lifetime = self
            .ledger
            .get_advisor_earnings(advisor.id, EarningsPeriod::All)
            .await?;

        let (group_trades, successes, attempts) = self.trade_totals(advisor.id).await?;
        let success_rate = if attempts == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(successes) * Decimal::ONE_HUNDRED / Decimal::from(attempts)).round_dp(2)
        };

        Ok(AdvisorStats {
            total_clients: links.len(),
            active_clients,
            total_earnings: advisor.total_earnings,
            total_volume: advisor.total_volume,
            earnings_30d: month.total_earnings,
            volume_30d: month.total_volume,
            average_commission: lifetime.average_commission,
            group_trades,
            success_rate,
        })
    }

    /// `(trades, successful client orders, client orders)` over all history.
    async fn trade_totals(&self, advisor_id: AdvisorId) -> ApiResult<(usize, usize, usize)> {
        let limit = self.executor.config().max_page_size;
        let mut page = 1;
        let mut trades = 0;
        let mut successes = 0;
        let mut attempts = 0;
        loop {
            let batch = self.executor.history(advisor_id, page, limit).await?;
            if batch.trades.is_empty() {
                break;
            }
            for trade in &batch.trades {
                trades += 1;
                successes += trade.success_count;
                attempts += trade.total_count;
            }
            if page >= batch.total_pages {
                break;
            }
            page += 1;
        }
        Ok((trades, successes, attempts))
    }
}
