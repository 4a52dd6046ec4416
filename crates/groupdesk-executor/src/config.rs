//! Executor configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Highest leverage a group trade may request.
    #[serde(default = "default_max_leverage")]
    pub max_leverage: Decimal,
    /// Per-client submission timeout. `None` waits indefinitely.
    #[serde(default)]
    pub order_timeout_ms: Option<u64>,
    /// Artificial latency of the simulated order placer.
    #[serde(default)]
    pub simulated_latency_ms: u64,
    /// Largest page size for trade history.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_max_leverage() -> Decimal {
    Decimal::from(100)
}

fn default_max_page_size() -> usize {
    100
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_leverage: default_max_leverage(),
            order_timeout_ms: None,
            simulated_latency_ms: 0,
            max_page_size: default_max_page_size(),
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_leverage < Decimal::ONE {
            return Err(format!("executor.max_leverage {} below 1", self.max_leverage));
        }
        if self.order_timeout_ms == Some(0) {
            return Err("executor.order_timeout_ms must be positive".to_string());
        }
        if self.max_page_size == 0 {
            return Err("executor.max_page_size must be at least 1".to_string());
        }
        Ok(())
    }
}
