//! Wire-facing data model
//!
//! Everything here deserializes straight from gateway responses and is owned
//! by the view that fetched it; there is no shared mutable cache.

pub mod report;
pub mod sandbox;
pub mod scenario;
pub mod status;

pub use report::ConformanceReport;
pub use sandbox::{Sandbox, SandboxConfig, SandboxConfigDraft};
pub use scenario::{
    any_scenario_running, start_allowed, stop_allowed, ModuleDigest, SandboxStatus,
    ScenarioDigest, ScenarioStatus, WaitingEntry,
};
pub use status::ConformanceStatus;
