//! Core domain types for the GroupDesk advisor group-trade aggregator.
//!
//! This crate provides the types shared by every other crate:
//! - Identifier newtypes (`UserId`, `AdvisorId`, `OrderId`, `AdvisorCode`, ...)
//! - `UsdAmount` (256-bit) and `CommissionRate` (basis points)
//! - Advisors, users and client links
//! - Group trade intents, per-client results and records
//! - Commission entries and their status machine

pub mod advisor;
pub mod amount;
pub mod commission;
pub mod error;
pub mod ids;
pub mod order;
pub mod trade;

use std::pin::Pin;

pub use advisor::{Advisor, AdvisorProfile, ClientLink, User, UserRole};
pub use amount::{CommissionRate, UsdAmount, BPS_DENOMINATOR};
pub use commission::{CommissionEntry, CommissionStatus, EarningsPeriod};
pub use error::{CoreError, ErrorClass, Result};
pub use ids::{AdvisorCode, AdvisorId, CommissionId, GroupTradeId, LinkId, OrderId, UserId};
pub use order::{OrderRecord, OrderStatus, OrderType, TradeSide};
pub use trade::{GroupTradeIntent, GroupTradeRecord, PerClientResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
