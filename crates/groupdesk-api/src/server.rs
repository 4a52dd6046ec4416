//! HTTP server implementation using axum.

use std::future::Future;

use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let advisors = Router::new()
        .route("/register", post(handlers::register))
        .route("/link-client", post(handlers::link_client))
        .route("/unlink-client", post(handlers::unlink_client))
        .route("/group-trade", post(handlers::group_trade))
        .route("/earnings", get(handlers::earnings))
        .route("/clients", get(handlers::clients))
        .route("/group-trades", get(handlers::group_trades))
        .route("/stats/overview", get(handlers::stats_overview))
        .route("/profile", put(handlers::update_profile))
        .route("/{code}", get(handlers::advisor_profile));

    Router::new()
        .nest("/api/advisors", advisors)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(state: &AppState) -> std::io::Result<TcpListener> {
    TcpListener::bind(state.config.bind_addr()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "Starting HTTP server");

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Run the HTTP server on the configured address.
pub async fn run_server<F>(state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(&state).await?;
    serve(listener, state, shutdown).await
}
