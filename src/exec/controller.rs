//! Scenario execution controller
//!
//! The client-side state machine that drives one scenario view: it settles
//! the sandbox through the poller before every status read, gates operator
//! submissions, and reconciles with the server's state after every action.
//! Exactly one logical operation is in flight per controller; the state gate
//! enforces it.

use serde_json::Value;

use crate::common::{Error, Result};
use crate::model::{ScenarioStatus, WaitingEntry};
use crate::rpc::ConformanceApi;

use super::input::{self, ActionInputKind};
use super::poller::{await_sandbox_idle, PollSettings};
use super::ViewGeneration;

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// No scenario selected yet
    Idle,
    /// Poller and status fetch outstanding
    LoadingStatus,
    /// Status loaded, operator may act
    ReadyForInput,
    /// Action input submission outstanding
    SubmittingAction,
    /// Complete/skip request outstanding
    CompletingAction,
    /// A user-visible failure awaiting acknowledgement
    Error(String),
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::LoadingStatus => write!(f, "loading status"),
            Self::ReadyForInput => write!(f, "ready for input"),
            Self::SubmittingAction => write!(f, "submitting action"),
            Self::CompletingAction => write!(f, "completing action"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

type WaitingObserver = Box<dyn FnMut(&[WaitingEntry]) + Send>;

/// State machine driving one scenario view
pub struct ScenarioController {
    api: ConformanceApi,
    sandbox_id: String,
    scenario_id: String,
    settings: PollSettings,
    generation: ViewGeneration,
    state: ControllerState,
    status: Option<ScenarioStatus>,
    input_kind: ActionInputKind,
    input_buffer: String,
    waiting_observer: Option<WaitingObserver>,
}

impl ScenarioController {
    pub fn new(
        api: ConformanceApi,
        sandbox_id: impl Into<String>,
        scenario_id: impl Into<String>,
        settings: PollSettings,
    ) -> Self {
        Self {
            api,
            sandbox_id: sandbox_id.into(),
            scenario_id: scenario_id.into(),
            settings,
            generation: ViewGeneration::new(),
            state: ControllerState::Idle,
            status: None,
            input_kind: ActionInputKind::FreeText,
            input_buffer: String::new(),
            waiting_observer: None,
        }
    }

    /// Observe waiting entries live while the poller runs
    pub fn set_waiting_observer(&mut self, observer: impl FnMut(&[WaitingEntry]) + Send + 'static) {
        self.waiting_observer = Some(Box::new(observer));
    }

    /// Generation handle for external cancellation (navigation away)
    pub fn generation(&self) -> ViewGeneration {
        self.generation.clone()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn status(&self) -> Option<&ScenarioStatus> {
        self.status.as_ref()
    }

    pub fn input_kind(&self) -> ActionInputKind {
        self.input_kind
    }

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Replace the operator's typed text
    pub fn set_input_buffer(&mut self, text: impl Into<String>) {
        self.input_buffer = text.into();
    }

    /// Whether the pending complete/skip needs an operator confirmation step
    pub fn confirmation_required(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.confirmation_required)
    }

    /// Select the scenario and load its status
    pub async fn activate(&mut self) -> Result<()> {
        self.load_status().await
    }

    /// Tear the view down; late results for outstanding calls are discarded
    pub fn detach(&mut self) {
        self.generation.bump();
        self.state = ControllerState::Idle;
    }

    /// Return from `Error` to an actionable state, keeping the typed input
    pub fn acknowledge_error(&mut self) {
        if matches!(self.state, ControllerState::Error(_)) {
            self.state = if self.status.is_some() {
                ControllerState::ReadyForInput
            } else {
                ControllerState::Idle
            };
        }
    }

    /// Settle the sandbox, fetch scenario status, and re-seed the input buffer
    pub async fn load_status(&mut self) -> Result<()> {
        self.state = ControllerState::LoadingStatus;
        let interest = self.generation.observe();

        let api = self.api.clone();
        let observer = &mut self.waiting_observer;
        let poll_result = await_sandbox_idle(
            &api,
            &self.sandbox_id,
            &self.settings,
            &interest,
            |entries| {
                if let Some(observer) = observer {
                    observer(entries);
                }
            },
        )
        .await;
        if let Err(e) = poll_result {
            return self.fail(e);
        }

        let status = match api.get_scenario_status(&self.sandbox_id, &self.scenario_id).await {
            Ok(status) => status,
            Err(e) => return self.fail(e),
        };
        if interest.is_stale() {
            return Err(Error::Stale);
        }

        tracing::debug!(
            scenario_id = %self.scenario_id,
            action = status.current_action_title(),
            input_required = status.input_required,
            "scenario status loaded"
        );

        self.input_kind = ActionInputKind::for_status(&status);
        self.input_buffer = input::seed_buffer(&status);
        self.status = Some(status);
        self.state = ControllerState::ReadyForInput;
        Ok(())
    }

    /// Reload status after one poll interval has passed
    ///
    /// Paces retry loops that wait for the counterpart party to act: when
    /// the sandbox is idle the poller returns immediately, so refetching
    /// without this delay would hammer the server.
    pub async fn reload_after_interval(&mut self) -> Result<()> {
        tokio::time::sleep(self.settings.interval).await;
        self.load_status().await
    }

    /// Submit the operator's action input, or an acknowledgement when
    /// `with_input` is false
    pub async fn submit(&mut self, with_input: bool) -> Result<()> {
        if self.state != ControllerState::ReadyForInput {
            return Err(Error::invalid_state("submit action input", &self.state));
        }
        let status = self.status.as_ref().ok_or(Error::MissingActionId)?;
        let action_id = status
            .prompt_action_id
            .clone()
            .ok_or(Error::MissingActionId)?;

        if with_input && status.input_required && self.input_buffer.trim().is_empty() {
            // inline validation: state and buffer untouched, no network call
            return Err(Error::InvalidInput(
                "action input must not be blank".to_string(),
            ));
        }

        // a parse failure must never reach the gateway
        let payload = input::encode(self.input_kind, &self.input_buffer, with_input)?;

        self.state = ControllerState::SubmittingAction;
        let interest = self.generation.observe();
        let result = self
            .api
            .handle_action_input(&self.sandbox_id, &self.scenario_id, &action_id, payload)
            .await;
        if interest.is_stale() {
            return Err(Error::Stale);
        }

        match result {
            Ok(_) => {
                // reconcile with the server's new state
                self.load_status().await
            }
            Err(e) => {
                // the typed text is preserved verbatim for correction
                self.fail(e)
            }
        }
    }

    /// Mark the current action complete, or skip it
    ///
    /// Confirmation (when [`Self::confirmation_required`]) is the caller's
    /// responsibility before invoking this. The status is always reloaded
    /// afterwards, success or failure, so the view cannot desync from server
    /// truth.
    pub async fn complete(&mut self, skip: bool) -> Result<()> {
        if self.state != ControllerState::ReadyForInput {
            return Err(Error::invalid_state("complete current action", &self.state));
        }
        if skip && !self.status.as_ref().is_some_and(|s| s.is_skippable) {
            return Err(Error::NotSkippable);
        }

        self.state = ControllerState::CompletingAction;
        let interest = self.generation.observe();
        let result = self.api.complete_current_action(&self.sandbox_id, skip).await;
        if interest.is_stale() {
            return Err(Error::Stale);
        }

        let refresh = self.load_status().await;
        match result {
            Ok(()) => refresh,
            Err(e) => self.fail(e),
        }
    }

    /// Record a user-visible failure; stale results are passed through silently
    fn fail(&mut self, error: Error) -> Result<()> {
        if error.is_stale() {
            return Err(error);
        }
        tracing::warn!(scenario_id = %self.scenario_id, %error, "scenario operation failed");
        self.state = ControllerState::Error(error.to_string());
        Err(error)
    }

    /// Raw value helper for rendering the current sub-report, if any
    pub fn sub_report(&self) -> Option<&crate::model::ConformanceReport> {
        self.status.as_ref()?.conformance_sub_report.as_ref()
    }

    /// Exchange log of the current action, for operator inspection
    pub async fn current_action_exchanges(&self) -> Result<Value> {
        self.api
            .get_current_action_exchanges(&self.sandbox_id, &self.scenario_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::ScriptedGateway;
    use serde_json::json;
    use std::sync::Arc;

    fn controller_with(gateway: Arc<ScriptedGateway>) -> ScenarioController {
        ScenarioController::new(
            ConformanceApi::new(gateway),
            "sb",
            "sc",
            PollSettings::default(),
        )
    }

    fn idle_sandbox(gateway: &ScriptedGateway) {
        gateway.respond("getSandboxStatus", json!({"waiting": []}));
    }

    fn json_prompt_status() -> serde_json::Value {
        json!({
            "isRunning": true,
            "nextActions": "UC1 Submit booking - then await confirmation",
            "promptText": "Submit the booking request below",
            "jsonForPromptText": {"x": 1},
            "promptActionId": "act-1",
            "inputRequired": true,
            "isSkippable": false,
            "needsAction": true
        })
    }

    #[tokio::test]
    async fn test_activate_preseeds_buffer_from_prompt_json() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        let mut controller = controller_with(gateway);

        controller.activate().await.unwrap();

        assert_eq!(*controller.state(), ControllerState::ReadyForInput);
        assert_eq!(controller.input_kind(), ActionInputKind::StructuredJson);
        let parsed: serde_json::Value =
            serde_json::from_str(controller.input_buffer()).unwrap();
        assert_eq!(parsed, json!({"x": 1}));
        assert_eq!(
            controller.status().unwrap().current_action_title(),
            "UC1 Submit booking"
        );
    }

    #[tokio::test]
    async fn test_submitting_unchanged_seed_sends_structural_payload() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        gateway.respond("handleActionInput", json!({}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.submit(true).await.unwrap();

        let calls = gateway.calls_for("handleActionInput");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params["actionId"], "act-1");
        // pretty-printing then parsing back yields the structurally equal value
        assert_eq!(calls[0].params["actionInput"], json!({"x": 1}));
        // submission reconciled with a fresh status load
        assert_eq!(gateway.calls_for("getScenarioStatus").len(), 2);
        assert_eq!(*controller.state(), ControllerState::ReadyForInput);
    }

    #[tokio::test]
    async fn test_free_text_is_submitted_verbatim_as_string() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond(
            "getScenarioStatus",
            json!({
                "nextActions": "UC2 Provide reference",
                "promptActionId": "act-2",
                "inputRequired": true
            }),
        );
        gateway.respond("handleActionInput", json!({}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        assert_eq!(controller.input_kind(), ActionInputKind::FreeText);
        assert_eq!(controller.input_buffer(), "");

        // text that happens to be valid JSON still goes out as a string
        controller.set_input_buffer("  {\"x\": 1}  ");
        controller.submit(true).await.unwrap();

        let calls = gateway.calls_for("handleActionInput");
        assert_eq!(calls[0].params["actionInput"], json!("{\"x\": 1}"));
    }

    #[tokio::test]
    async fn test_blank_required_input_never_reaches_the_gateway() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.set_input_buffer("   \n ");
        let err = controller.submit(true).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(gateway.calls_for("handleActionInput").is_empty());
        assert_eq!(*controller.state(), ControllerState::ReadyForInput);
        assert_eq!(controller.input_buffer(), "   \n ");
    }

    #[tokio::test]
    async fn test_malformed_json_blocks_submission_and_preserves_text() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.set_input_buffer("{\"x\": }");
        let err = controller.submit(true).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(gateway.calls_for("handleActionInput").is_empty());
        assert_eq!(controller.input_buffer(), "{\"x\": }");
        assert_eq!(*controller.state(), ControllerState::ReadyForInput);
    }

    #[tokio::test]
    async fn test_submit_without_prompt_action_id_fails() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json!({"nextActions": ""}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        let err = controller.submit(false).await.unwrap_err();
        assert!(matches!(err, Error::MissingActionId));
        assert!(gateway.calls_for("handleActionInput").is_empty());
    }

    #[tokio::test]
    async fn test_acknowledgement_only_submission_sends_absent_input() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond(
            "getScenarioStatus",
            json!({"nextActions": "UC3 Acknowledge", "promptActionId": "act-3"}),
        );
        gateway.respond("handleActionInput", json!({}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.submit(false).await.unwrap();

        let calls = gateway.calls_for("handleActionInput");
        assert!(
            !calls[0].params.as_object().unwrap().contains_key("actionInput"),
            "acknowledgement must omit actionInput entirely"
        );
    }

    #[tokio::test]
    async fn test_failed_submission_preserves_input_and_surfaces_error() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        gateway.respond("handleActionInput", json!({"error": "action already handled"}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.set_input_buffer("{\"x\": 2}");
        let err = controller.submit(true).await.unwrap_err();

        assert!(matches!(err, Error::Operation { .. }));
        assert_eq!(controller.input_buffer(), "{\"x\": 2}");
        assert!(matches!(controller.state(), ControllerState::Error(_)));

        controller.acknowledge_error();
        assert_eq!(*controller.state(), ControllerState::ReadyForInput);
        assert_eq!(controller.input_buffer(), "{\"x\": 2}");
    }

    #[tokio::test]
    async fn test_complete_and_skip_are_distinct_requests() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond(
            "getScenarioStatus",
            json!({
                "nextActions": "UC4 Await traffic",
                "promptActionId": "act-4",
                "isSkippable": true
            }),
        );
        gateway.respond("completeCurrentAction", json!({}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        controller.complete(false).await.unwrap();
        controller.complete(true).await.unwrap();

        let calls = gateway.calls_for("completeCurrentAction");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].params, json!({"sandboxId": "sb", "skip": false}));
        assert_eq!(calls[1].params, json!({"sandboxId": "sb", "skip": true}));
    }

    #[tokio::test]
    async fn test_skip_is_refused_when_not_skippable() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        let err = controller.complete(true).await.unwrap_err();
        assert!(matches!(err, Error::NotSkippable));
        assert!(gateway.calls_for("completeCurrentAction").is_empty());
    }

    #[tokio::test]
    async fn test_failed_completion_still_refreshes_status() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond("getScenarioStatus", json_prompt_status());
        gateway.respond("completeCurrentAction", json!({"error": "nothing to complete"}));
        let mut controller = controller_with(gateway.clone());

        controller.activate().await.unwrap();
        let err = controller.complete(false).await.unwrap_err();

        assert!(matches!(err, Error::Operation { .. }));
        // the refresh ran regardless, so the view cannot desync
        assert_eq!(gateway.calls_for("getScenarioStatus").len(), 2);
        assert!(matches!(controller.state(), ControllerState::Error(_)));
    }

    #[tokio::test]
    async fn test_late_status_result_is_dropped_after_detach() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);

        let mut controller = controller_with(gateway.clone());
        let generation = controller.generation();
        gateway.respond_with("getScenarioStatus", move |_| {
            // the operator navigates away while the fetch is in flight
            generation.bump();
            Ok(json_prompt_status())
        });

        let err = controller.activate().await.unwrap_err();
        assert!(err.is_stale());
        // the late result was not applied to the stale view
        assert!(controller.status().is_none());
        assert_eq!(controller.input_buffer(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_waits_one_interval_before_refetching() {
        let gateway = Arc::new(ScriptedGateway::new());
        idle_sandbox(&gateway);
        gateway.respond(
            "getScenarioStatus",
            json!({"isRunning": true, "nextActions": ""}),
        );
        let mut controller = controller_with(gateway.clone());
        controller.activate().await.unwrap();

        let started = tokio::time::Instant::now();
        controller.reload_after_interval().await.unwrap();

        // an idle sandbox makes the poller return instantly; the pacing
        // delay is what keeps the retry loop off the server's back
        assert!(started.elapsed() >= PollSettings::default().interval);
        assert_eq!(gateway.calls_for("getScenarioStatus").len(), 2);
    }

    #[tokio::test]
    async fn test_only_one_operation_in_flight_per_view() {
        let gateway = Arc::new(ScriptedGateway::new());
        let mut controller = controller_with(gateway.clone());

        // submitting before any status load is refused by the state gate
        let err = controller.submit(true).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));
        assert!(gateway.calls().is_empty());
    }
}
