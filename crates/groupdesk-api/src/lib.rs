//! HTTP surface for GroupDesk.
//!
//! Advisor routes live under `/api/advisors`. The caller is identified by
//! the `x-user-id` header; advisor-only routes also require the advisor
//! role. `/health` and `/metrics` are unauthenticated.

pub mod auth;
pub mod config;
pub mod desk;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use auth::{Caller, USER_ID_HEADER};
pub use config::ApiConfig;
pub use desk::{AdvisorDesk, AdvisorStats, ClientSummary};
pub use error::{ApiError, ApiResult};
pub use server::{bind, create_router, run_server, serve};
pub use state::AppState;
