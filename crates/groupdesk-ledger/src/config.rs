//! Ledger configuration.

use serde::{Deserialize, Serialize};

use groupdesk_core::EarningsPeriod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Bounded queue between the executor and the commission worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Window used when an earnings query names none.
    #[serde(default)]
    pub default_period: EarningsPeriod,
}

fn default_queue_capacity() -> usize {
    1024
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            default_period: EarningsPeriod::default(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("ledger.queue_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_from_toml() {
        let config: LedgerConfig = toml::from_str("default_period = \"7d\"").unwrap();
        assert_eq!(config.default_period, EarningsPeriod::Week);
        assert_eq!(config.queue_capacity, 1024);
    }
}
