//! End-to-end tests over real HTTP.
//!
//! Each test starts the full application on an ephemeral port and talks
//! to it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use groupdesk_core::{UserId, UserRole};
use groupdesk_executor::{MockOrderPlacer, PlacementError};
use groupdesk_ledger::CommissionTrackerHandle;
use groupdesk_notify::{Notification, NotificationEvent};
use groupdesk_server::{AppConfig, AppResult, Application, NotifySink, SeedUser};
use groupdesk_store::MemoryStores;

const ADVISOR: &str = "00000000-0000-4000-8000-0000000000a0";
const CLIENTS: [&str; 3] = [
    "00000000-0000-4000-8000-000000000001",
    "00000000-0000-4000-8000-000000000002",
    "00000000-0000-4000-8000-000000000003",
];

struct Running {
    base: String,
    http: reqwest::Client,
    stores: MemoryStores,
    commissions: CommissionTrackerHandle,
    /// Present when the broadcast sink is configured.
    events: Option<broadcast::Receiver<Notification>>,
    stop: oneshot::Sender<()>,
    join: JoinHandle<AppResult<()>>,
}

impl Running {
    async fn post(&self, path: &str, caller: &str, body: Value) -> (u16, Value) {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .header("x-user-id", caller)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn get(&self, path: &str, caller: Option<&str>) -> (u16, Value) {
        let mut request = self.http.get(format!("{}{path}", self.base));
        if let Some(id) = caller {
            request = request.header("x-user-id", id);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        self.join.await.unwrap().unwrap();
    }
}

fn seeded_config() -> AppConfig {
    let mut users = vec![SeedUser {
        id: Some(ADVISOR.parse().unwrap()),
        wallet: "0x00000000000000000000000000000000000000a0".to_string(),
        email: Some("advisor@example.com".to_string()),
        role: UserRole::Trader,
    }];
    for (i, id) in CLIENTS.iter().enumerate() {
        users.push(SeedUser {
            id: Some(id.parse().unwrap()),
            wallet: format!("0x{:040x}", i + 1),
            email: None,
            role: UserRole::Trader,
        });
    }
    AppConfig {
        users,
        ..AppConfig::default()
    }
}

async fn start(placer: impl FnOnce(&MemoryStores) -> Arc<MockOrderPlacer>) -> Running {
    start_with(seeded_config(), placer).await
}

async fn start_with(
    config: AppConfig,
    placer: impl FnOnce(&MemoryStores) -> Arc<MockOrderPlacer>,
) -> Running {
    let stores = MemoryStores::new();
    let placer = placer(&stores);
    let app = Application::with_order_placer(config, stores, placer)
        .await
        .unwrap();
    let stores = app.stores().clone();
    let commissions = app.commissions();
    let events = app.broadcast().map(|b| b.subscribe());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (stop, stopped) = oneshot::channel::<()>();
    let join = tokio::spawn(app.serve(listener, async {
        let _ = stopped.await;
    }));

    Running {
        base,
        http: reqwest::Client::new(),
        stores,
        commissions,
        events,
        stop,
        join,
    }
}

fn mock(stores: &MemoryStores) -> Arc<MockOrderPlacer> {
    Arc::new(MockOrderPlacer::new(stores.orders.clone()))
}

#[tokio::test]
async fn test_partial_failure_end_to_end() {
    let client_two: UserId = CLIENTS[1].parse().unwrap();
    let server = start(|stores| {
        let placer = mock(stores);
        placer.fail_for(client_two, PlacementError::Rejected("margin check failed".to_string()));
        placer
    })
    .await;

    let (status, body) = server
        .post(
            "/api/advisors/register",
            ADVISOR,
            json!({ "commission_rate": 25 }),
        )
        .await;
    assert_eq!(status, 201, "{body}");
    let code = body["advisor"]["advisor_code"].as_str().unwrap().to_string();

    for client in CLIENTS {
        let (status, body) = server
            .post(
                "/api/advisors/link-client",
                client,
                json!({ "advisor_code": code }),
            )
            .await;
        assert_eq!(status, 200, "{body}");
    }

    let (status, body) = server
        .post(
            "/api/advisors/group-trade",
            ADVISOR,
            json!({
                "market_id": "BTC-USD",
                "order_type": "limit",
                "side": "short",
                "size_usd": "2000",
                "leverage": "3",
                "price": "65000",
                "commission_rate": 25
            }),
        )
        .await;
    assert_eq!(status, 200, "{body}");
    let result = &body["result"];
    assert_eq!(result["success_count"], 2);
    assert_eq!(result["total_count"], 3);
    let failed: Vec<&Value> = result["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["success"] == false)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["client_id"], CLIENTS[1]);
    assert!(!failed[0]["error"].as_str().unwrap().is_empty());

    server.commissions.flush().await.unwrap();
    let entries = server.stores.commissions.all();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.client_id != client_two));

    let (status, body) = server.get("/api/advisors/earnings", Some(ADVISOR)).await;
    assert_eq!(status, 200);
    assert_eq!(body["earnings"]["period"], "30d");
    assert_eq!(body["earnings"]["total_earnings"], "1000");
    assert_eq!(body["earnings"]["total_volume"], "4000");

    let (status, body) = server.get(&format!("/api/advisors/{code}"), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["advisor"]["total_clients"], 3);

    server.stop().await;
}

#[tokio::test]
async fn test_zero_clients_and_roles_end_to_end() {
    let server = start(mock).await;

    let (status, body) = server
        .post("/api/advisors/group-trade", CLIENTS[0], json!({}))
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .post("/api/advisors/register", ADVISOR, json!({}))
        .await;
    assert_eq!(status, 201);

    let (status, body) = server
        .post(
            "/api/advisors/group-trade",
            ADVISOR,
            json!({
                "market_id": "BTC-USD",
                "order_type": "market",
                "side": "long",
                "size_usd": "100",
                "leverage": "1",
                "commission_rate": 30
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No active clients found");
    assert!(server.stores.trades.is_empty());

    let (status, body) = server.get("/api/advisors/group-trades", Some(ADVISOR)).await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = server.get("/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    server.stop().await;
}

#[tokio::test]
async fn test_broadcast_sink_publishes_registration() {
    let mut config = seeded_config();
    config.notify.sink = NotifySink::Broadcast;
    let mut server = start_with(config, mock).await;
    let mut events = server.events.take().unwrap();

    let (status, body) = server
        .post("/api/advisors/register", ADVISOR, json!({ "commission_rate": 25 }))
        .await;
    assert_eq!(status, 201, "{body}");
    let code = body["advisor"]["advisor_code"].as_str().unwrap().to_string();

    let received = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.recipient, ADVISOR.parse::<UserId>().unwrap());
    match received.event {
        NotificationEvent::AdvisorRegistered { advisor_code, .. } => {
            assert_eq!(advisor_code.as_str(), code);
        }
        other => panic!("unexpected event {other:?}"),
    }

    server.stop().await;
}

#[tokio::test]
async fn test_log_sink_has_no_broadcast() {
    let server = start(mock).await;
    assert!(server.events.is_none());
    server.stop().await;
}

#[test]
fn test_shipped_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
    let config = AppConfig::from_file(path).unwrap();
    assert_eq!(config.users.len(), 3);
    assert_eq!(config.advisor.default_commission_bps, 3000);
}
