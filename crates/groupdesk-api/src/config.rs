//! HTTP server configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on. 0 picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow any origin. When false no CORS headers are sent.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
    /// Page size for trade history when the query omits `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_permissive() -> bool {
    true
}

fn default_page_size() -> usize {
    20
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors_permissive(),
            default_page_size: default_page_size(),
        }
    }
}

impl ApiConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("api.host must not be empty".to_string());
        }
        if self.default_page_size == 0 {
            return Err("api.default_page_size must be at least 1".to_string());
        }
        Ok(())
    }
}
