//! Advisor registry and client link table for GroupDesk.
//!
//! - `AdvisorRegistry::register_advisor` / `get_advisor_by_code`
//! - `AdvisorRegistry::link_client_to_advisor` / `unlink_client_from_advisor`
//! - `AdvisorConfig`: commission bounds and code generation, passed in at
//!   construction

pub mod codes;
pub mod config;
pub mod error;
pub mod registry;

pub use codes::{CodeGenerator, RandomCodeGenerator, ScriptedCodeGenerator};
pub use config::AdvisorConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::{AdvisorRegistry, LinkReceipt};
