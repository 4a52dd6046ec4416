//! Advisor commission ledger for GroupDesk.
//!
//! Commission per successful client order is
//! `floor(notional * rate_bps / 10000)`, computed in 256-bit integers.
//! Entries start `pending` and may move once to `paid` or `cancelled`.

pub mod config;
pub mod error;
pub mod ledger;
pub mod worker;

pub use config::LedgerConfig;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{ClientBreakdown, CommissionLedger, EarningsReport};
pub use worker::{spawn_commission_worker, CommissionJob, CommissionMsg, CommissionTrackerHandle};
