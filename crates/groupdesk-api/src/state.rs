//! Shared state for axum handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::desk::AdvisorDesk;

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<AdvisorDesk>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(desk: Arc<AdvisorDesk>, config: ApiConfig) -> Self {
        Self { desk, config }
    }
}
