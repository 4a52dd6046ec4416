//! Persistence seams for GroupDesk.
//!
//! Each data grouping (users, advisors, links, group trades, commissions,
//! orders) is an independent async trait. The in-memory implementations are
//! what the service runs on today; a database backend plugs in behind the
//! same traits.

pub mod advisors;
pub mod commissions;
pub mod error;
pub mod links;
pub mod orders;
pub mod trades;
pub mod users;

use std::sync::Arc;

pub use advisors::{AdvisorProfileUpdate, AdvisorStore, InMemoryAdvisorStore};
pub use commissions::{CommissionStore, InMemoryCommissionStore};
pub use error::{StoreError, StoreResult};
pub use links::{InMemoryLinkStore, LinkStore};
pub use orders::{InMemoryOrderBook, OrderLookup};
pub use trades::{GroupTradeStore, InMemoryGroupTradeStore, Page};
pub use users::{InMemoryUserDirectory, UserDirectory};

/// Every in-memory store, shared behind `Arc`s.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    pub users: Arc<InMemoryUserDirectory>,
    pub advisors: Arc<InMemoryAdvisorStore>,
    pub links: Arc<InMemoryLinkStore>,
    pub trades: Arc<InMemoryGroupTradeStore>,
    pub commissions: Arc<InMemoryCommissionStore>,
    pub orders: Arc<InMemoryOrderBook>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }
}
