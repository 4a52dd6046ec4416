//! Group trade execution for GroupDesk.
//!
//! An advisor submits one trade intent; `GroupTradeExecutor` places it for
//! every actively linked client through the `OrderPlacer` seam, records the
//! per-client outcome and queues commission tracking for each fill.

pub mod config;
pub mod error;
pub mod executor;
pub mod placer;

pub use config::ExecutorConfig;
pub use error::{ExecutorError, ExecutorResult, PlacementError, PlacementResult};
pub use executor::{GroupTradeExecutor, GroupTradeOutcome, GroupTradePage};
pub use placer::{MockOrderPlacer, OrderPlacer, OrderSpec, PlacedOrder, SimulatedOrderPlacer};
