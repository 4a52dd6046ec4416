//! Advisor registry configuration.

use serde::{Deserialize, Serialize};

use groupdesk_core::CommissionRate;

/// Commission bounds and code generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Rate applied when registration omits one (bps).
    #[serde(default = "default_commission_bps")]
    pub default_commission_bps: u32,
    #[serde(default = "default_min_commission_bps")]
    pub min_commission_bps: u32,
    #[serde(default = "default_max_commission_bps")]
    pub max_commission_bps: u32,
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,
    /// Fresh codes tried before registration gives up on collisions.
    #[serde(default = "default_code_generation_attempts")]
    pub code_generation_attempts: u32,
}

fn default_commission_bps() -> u32 {
    3000
}

fn default_min_commission_bps() -> u32 {
    500
}

fn default_max_commission_bps() -> u32 {
    5000
}

fn default_max_description_len() -> usize {
    1000
}

fn default_code_generation_attempts() -> u32 {
    5
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            default_commission_bps: default_commission_bps(),
            min_commission_bps: default_min_commission_bps(),
            max_commission_bps: default_max_commission_bps(),
            max_description_len: default_max_description_len(),
            code_generation_attempts: default_code_generation_attempts(),
        }
    }
}

impl AdvisorConfig {
    /// Default rate as a typed value. Only valid after `validate`.
    pub fn default_rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.default_commission_bps).unwrap_or(CommissionRate::ZERO)
    }

    pub fn contains(&self, rate: CommissionRate) -> bool {
        (self.min_commission_bps..=self.max_commission_bps).contains(&rate.bps())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_commission_bps > CommissionRate::MAX.bps() {
            return Err(format!(
                "max_commission_bps {} exceeds 10000",
                self.max_commission_bps
            ));
        }
        if self.min_commission_bps > self.max_commission_bps {
            return Err(format!(
                "min_commission_bps {} > max_commission_bps {}",
                self.min_commission_bps, self.max_commission_bps
            ));
        }
        if !(self.min_commission_bps..=self.max_commission_bps)
            .contains(&self.default_commission_bps)
        {
            return Err(format!(
                "default_commission_bps {} outside [{}, {}]",
                self.default_commission_bps, self.min_commission_bps, self.max_commission_bps
            ));
        }
        if self.code_generation_attempts == 0 {
            return Err("code_generation_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
