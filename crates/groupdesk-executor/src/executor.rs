//! Group trade fan-out.
//!
//! One advisor intent becomes one order per actively linked client. The
//! orders are submitted concurrently and awaited all-settled: a client's
//! failure is recorded in that client's result and never aborts the others.
//! Nothing spans the fan-out transactionally, so a trade with partial
//! failures is still a completed trade.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use groupdesk_core::{
    AdvisorId, ClientLink, GroupTradeId, GroupTradeIntent, GroupTradeRecord, PerClientResult,
};
use groupdesk_ledger::{CommissionJob, CommissionTrackerHandle};
use groupdesk_registry::AdvisorRegistry;
use groupdesk_store::GroupTradeStore;
use groupdesk_telemetry::Metrics;

use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, ExecutorResult, PlacementError};
use crate::placer::{OrderPlacer, OrderSpec};

/// What the advisor gets back from one group trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTradeOutcome {
    pub group_trade_id: GroupTradeId,
    pub results: Vec<PerClientResult>,
    pub success_count: usize,
    pub total_count: usize,
}

/// One page of an advisor's group trade history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTradePage {
    pub trades: Vec<GroupTradeRecord>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

pub struct GroupTradeExecutor {
    config: ExecutorConfig,
    registry: Arc<AdvisorRegistry>,
    placer: Arc<dyn OrderPlacer>,
    trades: Arc<dyn GroupTradeStore>,
    commissions: CommissionTrackerHandle,
}

impl GroupTradeExecutor {
    pub fn new(
        config: ExecutorConfig,
        registry: Arc<AdvisorRegistry>,
        placer: Arc<dyn OrderPlacer>,
        trades: Arc<dyn GroupTradeStore>,
        commissions: CommissionTrackerHandle,
    ) -> Self {
        Self {
            config,
            registry,
            placer,
            trades,
            commissions,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Place `intent` for every client actively linked to `advisor_id`.
    ///
    /// Fails before any order is placed if the intent is malformed, the
    /// advisor is unknown or inactive, or there are no active clients. In
    /// those cases no record is persisted.
    pub async fn execute_group_trade(
        &self,
        advisor_id: AdvisorId,
        intent: GroupTradeIntent,
    ) -> ExecutorResult<GroupTradeOutcome> {
        if let Err(e) = self.validate_intent(&intent) {
            Metrics::group_trade_rejected();
            return Err(e);
        }

        let advisor = self.registry.get_advisor(advisor_id).await?;
        if !advisor.is_active {
            Metrics::group_trade_rejected();
            return Err(ExecutorError::AdvisorInactive);
        }

        let links = self.registry.active_links(advisor_id).await?;
        if links.is_empty() {
            Metrics::group_trade_rejected();
            return Err(ExecutorError::NoActiveClients);
        }

        let started = Instant::now();
        info!(
            advisor_id = %advisor_id,
            market_id = %intent.market_id,
            order_type = %intent.order_type,
            side = %intent.side,
            size_usd = %intent.size_usd,
            clients = links.len(),
            "Executing group trade"
        );

        let results = self.fan_out(&links, &intent).await;

        // Results line up with links, so each success uses its own link's rate.
        for (link, result) in links.iter().zip(&results) {
            if let (true, Some(order_id)) = (result.success, result.order_id.as_ref()) {
                self.commissions.track(CommissionJob {
                    order_id: order_id.clone(),
                    advisor_id,
                    rate: link.commission_rate,
                });
            }
        }

        let order_type = intent.order_type;
        let record = GroupTradeRecord::new(advisor_id, intent, results);
        let outcome = GroupTradeOutcome {
            group_trade_id: record.id,
            results: record.results.clone(),
            success_count: record.success_count,
            total_count: record.total_count,
        };

        // The orders are already placed; losing the record must not hide
        // that from the advisor.
        if let Err(e) = self.trades.insert(record).await {
            error!(
                advisor_id = %advisor_id,
                group_trade_id = %outcome.group_trade_id,
                error = %e,
                "Failed to persist group trade record"
            );
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        Metrics::group_trade_completed(
            &order_type.to_string(),
            outcome.success_count,
            outcome.total_count,
            elapsed_ms,
        );
        info!(
            advisor_id = %advisor_id,
            group_trade_id = %outcome.group_trade_id,
            success_count = outcome.success_count,
            total_count = outcome.total_count,
            elapsed_ms,
            "Group trade completed"
        );

        Ok(outcome)
    }

    /// Newest first. `page` is 1-based; `limit` is clamped to
    /// `1..=max_page_size`.
    pub async fn history(
        &self,
        advisor_id: AdvisorId,
        page: usize,
        limit: usize,
    ) -> ExecutorResult<GroupTradePage> {
        let page = page.max(1);
        let limit = limit.clamp(1, self.config.max_page_size);
        let offset = (page - 1).saturating_mul(limit);

        let result = self.trades.list_by_advisor(advisor_id, offset, limit).await?;
        Ok(GroupTradePage {
            trades: result.items,
            page,
            limit,
            total: result.total,
            total_pages: result.total.div_ceil(limit),
        })
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn validate_intent(&self, intent: &GroupTradeIntent) -> ExecutorResult<()> {
        let invalid = |msg: &str| Err(ExecutorError::InvalidIntent(msg.to_string()));

        if intent.market_id.trim().is_empty() {
            return invalid("market_id is required");
        }
        if intent.size_usd.is_zero() {
            return invalid("size_usd must be positive");
        }
        if intent.leverage < Decimal::ONE || intent.leverage > self.config.max_leverage {
            return Err(ExecutorError::InvalidIntent(format!(
                "leverage must be between 1 and {}",
                self.config.max_leverage
            )));
        }
        if intent.order_type.requires_price() && intent.price.map_or(true, |p| p.is_zero()) {
            return Err(ExecutorError::InvalidIntent(format!(
                "price is required for {} orders",
                intent.order_type
            )));
        }
        if intent.stop_loss.is_some_and(|p| p.is_zero()) {
            return invalid("stop_loss must be positive");
        }
        if intent.take_profit.is_some_and(|p| p.is_zero()) {
            return invalid("take_profit must be positive");
        }
        Ok(())
    }

    async fn fan_out(
        &self,
        links: &[ClientLink],
        intent: &GroupTradeIntent,
    ) -> Vec<PerClientResult> {
        let submissions = links.iter().map(|link| {
            let spec = OrderSpec::for_client(link.client_id, intent);
            self.submit(spec)
        });
        join_all(submissions).await
    }

    /// One attempt for one client. Every error ends up in the result.
    async fn submit(&self, spec: OrderSpec) -> PerClientResult {
        let client_id = spec.client_id;
        let placement = self.placer.place_order(spec);

        let placed = match self.config.order_timeout_ms {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), placement).await {
                Ok(result) => result,
                Err(_) => Err(PlacementError::Timeout(ms)),
            },
            None => placement.await,
        };

        match placed {
            Ok(order) => {
                debug!(client_id = %client_id, order_id = %order.order_id, "Client order placed");
                Metrics::client_order("success");
                PerClientResult::succeeded(client_id, order.order_id, order.tx_hash)
            }
            Err(e) => {
                warn!(client_id = %client_id, error = %e, "Client order failed");
                Metrics::client_order(match e {
                    PlacementError::Timeout(_) => "timeout",
                    _ => "failed",
                });
                PerClientResult::failed(client_id, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use groupdesk_core::{
        Advisor, CommissionRate, ErrorClass, OrderType, TradeSide, UsdAmount, User, UserId,
        UserRole,
    };
    use groupdesk_ledger::{spawn_commission_worker, CommissionLedger};
    use groupdesk_notify::{spawn_notifier, LogNotifier};
    use groupdesk_registry::AdvisorConfig;
    use groupdesk_store::{AdvisorStore, MemoryStores, UserDirectory};
    use rust_decimal_macros::dec;

    use crate::placer::MockOrderPlacer;

    struct Fixture {
        executor: GroupTradeExecutor,
        registry: Arc<AdvisorRegistry>,
        placer: Arc<MockOrderPlacer>,
        stores: MemoryStores,
        commissions: CommissionTrackerHandle,
    }

    fn fixture_with(config: ExecutorConfig) -> Fixture {
        let stores = MemoryStores::new();
        let (notifier, _) = spawn_notifier(Arc::new(LogNotifier), 64);
        let registry = Arc::new(AdvisorRegistry::new(
            AdvisorConfig::default(),
            stores.users.clone(),
            stores.advisors.clone(),
            stores.links.clone(),
            notifier,
        ));
        let ledger = Arc::new(CommissionLedger::new(
            stores.commissions.clone(),
            stores.orders.clone(),
            stores.advisors.clone(),
            stores.users.clone(),
        ));
        let (commissions, _) = spawn_commission_worker(ledger, 64);
        let placer = Arc::new(MockOrderPlacer::new(stores.orders.clone()));
        let executor = GroupTradeExecutor::new(
            config,
            registry.clone(),
            placer.clone(),
            stores.trades.clone(),
            commissions.clone(),
        );
        Fixture {
            executor,
            registry,
            placer,
            stores,
            commissions,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ExecutorConfig::default())
    }

    async fn user(f: &Fixture, byte: u8) -> User {
        f.stores
            .users
            .insert(User::new(Address::repeat_byte(byte), UserRole::Trader))
            .await
            .unwrap()
    }

    /// Advisor at 20% with `clients` linked clients, in link order.
    async fn advisor_with_clients(f: &Fixture, clients: u8) -> (Advisor, Vec<UserId>) {
        let owner = user(f, 0xa0).await;
        let advisor = f
            .registry
            .register_advisor(owner.id, Some(CommissionRate::from_bps(2000).unwrap()), None)
            .await
            .unwrap();
        let mut ids = Vec::new();
        for i in 1..=clients {
            let client = user(f, i).await;
            f.registry
                .link_client_to_advisor(client.id, advisor.advisor_code.as_str())
                .await
                .unwrap();
            ids.push(client.id);
        }
        (advisor, ids)
    }

    fn market_intent(size: u64) -> GroupTradeIntent {
        GroupTradeIntent {
            market_id: "ETH-USD".to_string(),
            order_type: OrderType::Market,
            side: TradeSide::Long,
            size_usd: UsdAmount::from_u64(size),
            leverage: dec!(5),
            price: None,
            stop_loss: None,
            take_profit: None,
            commission_rate: CommissionRate::from_bps(2000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let f = fixture();
        let (advisor, clients) = advisor_with_clients(&f, 3).await;
        f.placer.fail_for(
            clients[1],
            PlacementError::Rejected("insufficient margin".to_string()),
        );

        let outcome = f
            .executor
            .execute_group_trade(advisor.id, market_intent(1000))
            .await
            .unwrap();

        assert_eq!(outcome.total_count, 3);
        assert_eq!(outcome.success_count, 2);
        let order: Vec<_> = outcome.results.iter().map(|r| r.client_id).collect();
        assert_eq!(order, clients);
        assert!(outcome.results[0].success);
        assert!(!outcome.results[1].success);
        assert!(outcome.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("insufficient margin"));
        assert!(outcome.results[2].success);
        assert_eq!(f.placer.call_count(), 3);

        f.commissions.flush().await.unwrap();
        assert_eq!(f.stores.commissions.len(), 2);
        let stored = f.stores.advisors.find_by_id(advisor.id).await.unwrap().unwrap();
        assert_eq!(stored.total_earnings, UsdAmount::from_u64(400));
        assert_eq!(stored.total_volume, UsdAmount::from_u64(2000));
    }

    #[tokio::test]
    async fn test_record_counts_match_results() {
        let f = fixture();
        let (advisor, clients) = advisor_with_clients(&f, 2).await;
        f.placer
            .fail_for(clients[0], PlacementError::Unavailable("node down".to_string()));

        let outcome = f
            .executor
            .execute_group_trade(advisor.id, market_intent(500))
            .await
            .unwrap();

        let stored = f
            .stores
            .trades
            .find_by_id(outcome.group_trade_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_count, 2);
        assert_eq!(stored.success_count, 1);
        assert_eq!(stored.failure_count(), 1);
        assert_eq!(stored.results, outcome.results);
        assert_eq!(stored.intent.market_id, "ETH-USD");
    }

    #[tokio::test]
    async fn test_no_active_clients_persists_nothing() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 0).await;

        let err = f
            .executor
            .execute_group_trade(advisor.id, market_intent(1000))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::NoActiveClients));
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(err.to_string(), "No active clients found");
        assert!(f.stores.trades.is_empty());
        assert_eq!(f.placer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unlinked_clients_are_skipped() {
        let f = fixture();
        let (advisor, clients) = advisor_with_clients(&f, 3).await;
        f.registry
            .unlink_client_from_advisor(clients[0], advisor.id)
            .await
            .unwrap();

        let outcome = f
            .executor
            .execute_group_trade(advisor.id, market_intent(100))
            .await
            .unwrap();
        assert_eq!(outcome.total_count, 2);
        assert!(outcome.results.iter().all(|r| r.client_id != clients[0]));
    }

    #[tokio::test]
    async fn test_unknown_advisor() {
        let f = fixture();
        let err = f
            .executor
            .execute_group_trade(AdvisorId::new(), market_intent(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::AdvisorNotFound));
        assert_eq!(err.class(), ErrorClass::NotFound);
    }

    #[tokio::test]
    async fn test_leverage_up_to_one_hundred_accepted() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 1).await;

        for leverage in [dec!(75), dec!(100)] {
            let mut intent = market_intent(100);
            intent.leverage = leverage;
            let outcome = f
                .executor
                .execute_group_trade(advisor.id, intent)
                .await
                .unwrap();
            assert_eq!(outcome.success_count, 1);
        }
    }

    #[tokio::test]
    async fn test_invalid_intents_rejected_before_fan_out() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 1).await;

        let mut no_market = market_intent(100);
        no_market.market_id = "  ".to_string();
        let zero_size = market_intent(0);
        let mut too_much_leverage = market_intent(100);
        too_much_leverage.leverage = dec!(101);
        let mut no_leverage = market_intent(100);
        no_leverage.leverage = dec!(0.5);
        let mut limit_without_price = market_intent(100);
        limit_without_price.order_type = OrderType::Limit;
        let mut zero_stop = market_intent(100);
        zero_stop.stop_loss = Some(UsdAmount::ZERO);

        for intent in [
            no_market,
            zero_size,
            too_much_leverage,
            no_leverage,
            limit_without_price,
            zero_stop,
        ] {
            let err = f
                .executor
                .execute_group_trade(advisor.id, intent)
                .await
                .unwrap_err();
            assert!(matches!(err, ExecutorError::InvalidIntent(_)), "{err}");
            assert_eq!(err.class(), ErrorClass::Validation);
        }
        assert_eq!(f.placer.call_count(), 0);
        assert!(f.stores.trades.is_empty());
    }

    #[tokio::test]
    async fn test_limit_order_carries_price_to_every_client() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 2).await;
        let mut intent = market_intent(250);
        intent.order_type = OrderType::Limit;
        intent.price = Some(UsdAmount::from_u64(3100));
        intent.take_profit = Some(UsdAmount::from_u64(3500));

        let outcome = f.executor.execute_group_trade(advisor.id, intent).await.unwrap();
        assert_eq!(outcome.success_count, 2);
        for call in f.placer.calls() {
            assert_eq!(call.order_type, OrderType::Limit);
            assert_eq!(call.price, Some(UsdAmount::from_u64(3100)));
            assert_eq!(call.take_profit, Some(UsdAmount::from_u64(3500)));
            assert_eq!(call.size_usd, UsdAmount::from_u64(250));
        }
    }

    #[tokio::test]
    async fn test_hanging_client_times_out() {
        let f = fixture_with(ExecutorConfig {
            order_timeout_ms: Some(50),
            ..ExecutorConfig::default()
        });
        let (advisor, clients) = advisor_with_clients(&f, 2).await;
        f.placer.hang_for(clients[0]);

        let outcome = f
            .executor
            .execute_group_trade(advisor.id, market_intent(100))
            .await
            .unwrap();
        assert_eq!(outcome.success_count, 1);
        assert_eq!(
            outcome.results[0].error.as_deref(),
            Some("Order placement timed out after 50ms")
        );
        assert!(outcome.results[1].success);
    }

    #[tokio::test]
    async fn test_commission_uses_link_snapshot_rate() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 1).await;
        // New rate applies to future links only.
        f.registry
            .update_profile(advisor.id, None, Some(CommissionRate::from_bps(1000).unwrap()))
            .await
            .unwrap();

        f.executor
            .execute_group_trade(advisor.id, market_intent(1000))
            .await
            .unwrap();
        f.commissions.flush().await.unwrap();

        let entries = f.stores.commissions.all();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].commission_rate.bps(), 2000);
        assert_eq!(entries[0].commission_amount, UsdAmount::from_u64(200));
    }

    #[tokio::test]
    async fn test_history_paging_newest_first() {
        let f = fixture();
        let (advisor, _) = advisor_with_clients(&f, 1).await;
        let mut ids = Vec::new();
        for size in [100, 200, 300] {
            let outcome = f
                .executor
                .execute_group_trade(advisor.id, market_intent(size))
                .await
                .unwrap();
            ids.push(outcome.group_trade_id);
        }

        let first = f.executor.history(advisor.id, 1, 2).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.trades.len(), 2);
        assert_eq!(first.trades[0].id, ids[2]);

        let second = f.executor.history(advisor.id, 2, 2).await.unwrap();
        assert_eq!(second.trades.len(), 1);
        assert_eq!(second.trades[0].id, ids[0]);

        let clamped = f.executor.history(advisor.id, 0, 10_000).await.unwrap();
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.limit, 100);
    }
}
