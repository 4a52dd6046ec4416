//! Application wiring.
//!
//! Builds the stores, spawns the notifier and commission workers, and
//! hands the assembled desk to the HTTP server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use groupdesk_api::{AdvisorDesk, AppState};
use groupdesk_executor::{GroupTradeExecutor, OrderPlacer, SimulatedOrderPlacer};
use groupdesk_ledger::{spawn_commission_worker, CommissionLedger, CommissionTrackerHandle};
use groupdesk_notify::{
    spawn_notifier, BroadcastNotifier, LogNotifier, NotificationSink, NotifierHandle,
};
use groupdesk_registry::AdvisorRegistry;
use groupdesk_store::{MemoryStores, UserDirectory};

use crate::config::{AppConfig, NotifySink};
use crate::error::AppResult;

pub struct Application {
    config: AppConfig,
    stores: MemoryStores,
    state: AppState,
    notifier: NotifierHandle,
    commissions: CommissionTrackerHandle,
    broadcast: Option<Arc<BroadcastNotifier>>,
    workers: Vec<JoinHandle<()>>,
}

impl Application {
    /// Build with in-memory stores and the simulated order placer.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let stores = MemoryStores::new();
        let placer = SimulatedOrderPlacer::new(stores.orders.clone()).with_latency(
            Duration::from_millis(config.executor.simulated_latency_ms),
        );
        Self::with_order_placer(config, stores, Arc::new(placer)).await
    }

    /// Build around caller-supplied stores and order placer.
    pub async fn with_order_placer(
        config: AppConfig,
        stores: MemoryStores,
        placer: Arc<dyn OrderPlacer>,
    ) -> AppResult<Self> {
        config.validate()?;

        for seed in &config.users {
            let user = stores.users.insert(seed.to_user()?).await?;
            info!(user_id = %user.id, role = %user.role, "Seeded user");
        }

        let broadcast = match config.notify.sink {
            NotifySink::Broadcast => Some(Arc::new(BroadcastNotifier::new(
                config.notify.broadcast_capacity,
            ))),
            NotifySink::Log => None,
        };
        let sink: Arc<dyn NotificationSink> = match &broadcast {
            Some(b) => b.clone(),
            None => Arc::new(LogNotifier),
        };
        let (notifier, notifier_join) = spawn_notifier(sink, config.notify.queue_capacity);

        let registry = Arc::new(AdvisorRegistry::new(
            config.advisor.clone(),
            stores.users.clone(),
            stores.advisors.clone(),
            stores.links.clone(),
            notifier.clone(),
        ));

        let ledger = Arc::new(CommissionLedger::new(
            stores.commissions.clone(),
            stores.orders.clone(),
            stores.advisors.clone(),
            stores.users.clone(),
        ));
        let (commissions, commission_join) =
            spawn_commission_worker(ledger.clone(), config.ledger.queue_capacity);

        let executor = Arc::new(GroupTradeExecutor::new(
            config.executor.clone(),
            registry.clone(),
            placer,
            stores.trades.clone(),
            commissions.clone(),
        ));

        let desk = AdvisorDesk::new(registry, executor, ledger, stores.users.clone())
            .with_default_period(config.ledger.default_period);
        let state = AppState::new(Arc::new(desk), config.api.clone());

        Ok(Self {
            config,
            stores,
            state,
            notifier,
            commissions,
            broadcast,
            workers: vec![notifier_join, commission_join],
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn stores(&self) -> &MemoryStores {
        &self.stores
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn commissions(&self) -> CommissionTrackerHandle {
        self.commissions.clone()
    }

    /// Present when notifications go to the broadcast sink.
    pub fn broadcast(&self) -> Option<Arc<BroadcastNotifier>> {
        self.broadcast.clone()
    }

    /// Serve on the configured address until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        let listener = groupdesk_api::bind(&self.state).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then drain the workers.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            advisor_default_bps = self.config.advisor.default_commission_bps,
            notify_sink = ?self.config.notify.sink,
            "Starting application"
        );

        let served = groupdesk_api::serve(listener, self.state.clone(), shutdown).await;

        if let Err(e) = self.commissions.flush().await {
            error!(error = %e, "Commission worker did not drain");
        }
        self.commissions.shutdown().await;
        self.notifier.shutdown().await;
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker task failed");
            }
        }
        info!("Application stopped");

        served.map_err(Into::into)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
