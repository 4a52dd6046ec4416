//! GroupDesk service.
//!
//! Wires the advisor registry, group trade executor, commission ledger and
//! notifier behind the HTTP API:
//! - `AppConfig`: TOML configuration, one section per component
//! - `Application`: builds the components and serves until shutdown

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, NotifyConfig, NotifySink, SeedUser};
pub use error::{AppError, AppResult};
