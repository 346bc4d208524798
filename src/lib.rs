//! Conformance CLI - operator client for interactive conformance sandboxes
//!
//! This library drives a remote conformance-testing sandbox through its
//! single-endpoint operation protocol: it polls sandbox status, executes
//! scenarios action by action, encodes operator input, and renders the
//! hierarchical conformance report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod exec;
pub mod model;
pub mod rpc;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use exec::{ControllerState, ScenarioController};
pub use model::{ConformanceReport, ConformanceStatus, ScenarioStatus};
