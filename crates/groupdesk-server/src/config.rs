//! Application configuration.

use std::path::Path;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use groupdesk_api::ApiConfig;
use groupdesk_core::{User, UserId, UserRole};
use groupdesk_executor::ExecutorConfig;
use groupdesk_ledger::LedgerConfig;
use groupdesk_registry::AdvisorConfig;

use crate::error::{AppError, AppResult};

/// Where notifications go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifySink {
    /// Log each notification.
    #[default]
    Log,
    /// Fan out on an in-process broadcast channel.
    Broadcast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub sink: NotifySink,
    /// Bounded queue in front of the notifier.
    #[serde(default = "default_notify_queue_capacity")]
    pub queue_capacity: usize,
    /// Broadcast buffer per subscriber (broadcast sink only).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_notify_queue_capacity() -> usize {
    256
}

fn default_broadcast_capacity() -> usize {
    64
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sink: NotifySink::default(),
            queue_capacity: default_notify_queue_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// A user created at startup. The user directory is owned elsewhere in a
/// full deployment; seeding lets the service run standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    /// Fixed id so callers can send it as `x-user-id`. Random when omitted.
    #[serde(default)]
    pub id: Option<UserId>,
    pub wallet: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_seed_role")]
    pub role: UserRole,
}

fn default_seed_role() -> UserRole {
    UserRole::Trader
}

impl SeedUser {
    pub fn to_user(&self) -> AppResult<User> {
        let wallet = Address::from_str(self.wallet.trim())
            .map_err(|e| AppError::Config(format!("Invalid wallet {}: {e}", self.wallet)))?;
        let mut user = User::new(wallet, self.role);
        if let Some(id) = self.id {
            user.id = id;
        }
        user.email = self.email.clone();
        Ok(user)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

impl AppConfig {
    /// Load from `GROUPDESK_CONFIG` or `config/default.toml`, falling back
    /// to defaults when neither exists.
    pub fn load() -> AppResult<Self> {
        let config_path = std::env::var("GROUPDESK_CONFIG")
            .unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.api
            .validate()
            .and_then(|_| self.advisor.validate())
            .and_then(|_| self.executor.validate())
            .and_then(|_| self.ledger.validate())
            .map_err(AppError::Config)?;
        if self.notify.queue_capacity == 0 || self.notify.broadcast_capacity == 0 {
            return Err(AppError::Config(
                "notify capacities must be at least 1".to_string(),
            ));
        }
        for user in &self.users {
            user.to_user()?;
        }
        Ok(())
    }
}
