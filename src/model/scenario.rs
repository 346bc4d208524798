//! Scenario and sandbox live-state models
//!
//! All of these are value objects owned by the view that fetched them.
//! They are replaced wholesale by re-fetching; nothing here is incrementally
//! mutated or cached across views.

use serde::Deserialize;
use serde_json::Value;

use super::ConformanceReport;
use super::ConformanceStatus;

/// Separator between the current action's short title and the rest of the
/// next-actions description
const ACTION_TITLE_SEPARATOR: &str = " - ";

/// Summary of one scenario inside a sandbox's module listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDigest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_running: bool,
    pub conformance_status: ConformanceStatus,
}

/// One module of a sandbox's scenario listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDigest {
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDigest>,
}

/// Per-scenario live execution state
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStatus {
    #[serde(default)]
    pub is_running: bool,
    /// Composite description; the segment before the first `" - "` is the
    /// current action's short title
    #[serde(default)]
    pub next_actions: String,
    #[serde(default)]
    pub prompt_text: String,
    /// Present when the pending action expects a structured JSON value
    /// rather than free text
    #[serde(default)]
    pub json_for_prompt_text: Option<Value>,
    /// Opaque correlation token required on submission. Defined whenever any
    /// action can be submitted; submitting without it must fail.
    #[serde(default)]
    pub prompt_action_id: Option<String>,
    #[serde(default)]
    pub confirmation_required: bool,
    #[serde(default)]
    pub input_required: bool,
    #[serde(default)]
    pub is_skippable: bool,
    #[serde(default)]
    pub needs_action: bool,
    #[serde(default)]
    pub conformance_sub_report: Option<ConformanceReport>,
}

impl ScenarioStatus {
    /// Short title of the current action (first `next_actions` segment)
    pub fn current_action_title(&self) -> &str {
        match self.next_actions.split_once(ACTION_TITLE_SEPARATOR) {
            Some((title, _)) => title,
            None => &self.next_actions,
        }
    }
}

/// One advisory record of a party blocked on another party's pending action
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingEntry {
    pub who: String,
    pub for_whom: String,
    pub to_do_what: String,
}

impl std::fmt::Display for WaitingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is waiting for {} to {}", self.who, self.for_whom, self.to_do_what)
    }
}

/// Transient blocked-on-external-party state of a sandbox. Never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SandboxStatus {
    #[serde(default)]
    pub waiting: Vec<WaitingEntry>,
}

impl SandboxStatus {
    /// Whether the sandbox is idle (not blocked on any external actor)
    pub fn is_idle(&self) -> bool {
        self.waiting.is_empty()
    }
}

/// Compute whether any scenario in a module listing is currently running
///
/// While one scenario runs, starting or restarting any other scenario in the
/// same sandbox is forbidden; only the running one may be stopped.
pub fn any_scenario_running(modules: &[ModuleDigest]) -> bool {
    modules
        .iter()
        .flat_map(|m| m.scenarios.iter())
        .any(|s| s.is_running)
}

/// Whether the start/restart action is offered for the given scenario
pub fn start_allowed(modules: &[ModuleDigest], scenario_id: &str) -> bool {
    !any_scenario_running(modules)
        && modules
            .iter()
            .flat_map(|m| m.scenarios.iter())
            .any(|s| s.id == scenario_id)
}

/// Whether the stop action is offered for the given scenario
pub fn stop_allowed(modules: &[ModuleDigest], scenario_id: &str) -> bool {
    modules
        .iter()
        .flat_map(|m| m.scenarios.iter())
        .any(|s| s.id == scenario_id && s.is_running)
}
