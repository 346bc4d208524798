//! End-to-end scenario-execution tests against the scripted gateway
//!
//! These drive the full client-side flow: start a scenario, settle the
//! sandbox through the poller, load scenario status, and submit operator
//! input, verifying the exact operations and payloads that reach the
//! gateway.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use conformance::exec::{await_sandbox_idle, PollSettings, ScenarioController, ViewGeneration};
use conformance::model::{start_allowed, ModuleDigest};
use conformance::rpc::mock::ScriptedGateway;
use conformance::rpc::ConformanceApi;
use conformance::ControllerState;

#[tokio::test]
async fn start_then_drive_scenario_submits_prefilled_json() {
    let gateway = Arc::new(ScriptedGateway::new());

    // one NO_TRAFFIC scenario in the sandbox's single module
    gateway.respond(
        "getScenarioDigests",
        json!([{
            "moduleName": "Booking",
            "scenarios": [{
                "id": "sc-1", "name": "UC1", "isRunning": false,
                "conformanceStatus": "NO_TRAFFIC"
            }]
        }]),
    );
    gateway.respond("startOrStopScenario", json!({}));
    gateway.respond("getSandboxStatus", json!({"waiting": []}));
    gateway.respond(
        "getScenarioStatus",
        json!({
            "isRunning": true,
            "nextActions": "UC1 Submit booking - then await confirmation",
            "promptText": "Send the booking request below",
            "jsonForPromptText": {"x": 1},
            "promptActionId": "act-1",
            "inputRequired": true,
            "needsAction": true
        }),
    );
    gateway.respond("handleActionInput", json!({}));

    let api = ConformanceApi::new(gateway.clone());

    // the listing allows starting the idle scenario
    let modules: Vec<ModuleDigest> = api.get_scenario_digests("sb-1").await.unwrap();
    assert!(start_allowed(&modules, "sc-1"));

    api.start_or_stop_scenario("sb-1", "sc-1").await.unwrap();
    assert_eq!(gateway.calls_for("startOrStopScenario").len(), 1);

    // navigate to the scenario view
    let mut controller =
        ScenarioController::new(api, "sb-1", "sc-1", PollSettings::default());
    controller.activate().await.unwrap();

    // the sandbox was idle immediately, so exactly one status poll ran
    assert_eq!(gateway.calls_for("getSandboxStatus").len(), 1);

    // the input buffer is pre-filled with the pretty-printed prompt JSON
    assert_eq!(*controller.state(), ControllerState::ReadyForInput);
    let seeded: serde_json::Value = serde_json::from_str(controller.input_buffer()).unwrap();
    assert_eq!(seeded, json!({"x": 1}));

    // submitting the unchanged input sends the structural payload
    controller.submit(true).await.unwrap();
    let submissions = gateway.calls_for("handleActionInput");
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].params,
        json!({
            "sandboxId": "sb-1",
            "scenarioId": "sc-1",
            "actionId": "act-1",
            "actionInput": {"x": 1}
        })
    );
}

#[tokio::test(start_paused = true)]
async fn poller_budget_expires_and_scenario_status_is_still_fetched() {
    let gateway = Arc::new(ScriptedGateway::new());

    // the sandbox stays blocked on the external party forever
    gateway.respond(
        "getSandboxStatus",
        json!({"waiting": [
            {"who": "Carrier", "forWhom": "Shipper", "toDoWhat": "send UC1 request"}
        ]}),
    );
    gateway.respond(
        "getScenarioStatus",
        json!({"isRunning": true, "nextActions": ""}),
    );

    let api = ConformanceApi::new(gateway.clone());
    let settings = PollSettings {
        budget: Duration::from_secs(60),
        interval: Duration::from_millis(750),
    };

    let started = tokio::time::Instant::now();
    let mut controller = ScenarioController::new(api, "sb-1", "sc-1", settings);
    controller.activate().await.unwrap();

    // polling stopped once the budget was exceeded
    let elapsed = started.elapsed();
    assert!(elapsed >= settings.budget);
    assert!(elapsed <= settings.budget + settings.interval + Duration::from_secs(1));

    // and the controller proceeded to read scenario status regardless
    assert_eq!(gateway.calls_for("getScenarioStatus").len(), 1);
    assert_eq!(*controller.state(), ControllerState::ReadyForInput);
    assert!(controller.status().unwrap().is_running);
}

#[tokio::test(start_paused = true)]
async fn standalone_poller_retains_last_waiting_snapshot() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.respond(
        "getSandboxStatus",
        json!({"waiting": [
            {"who": "Carrier", "forWhom": "Shipper", "toDoWhat": "send UC2 request"}
        ]}),
    );
    let api = ConformanceApi::new(gateway);

    let settings = PollSettings {
        budget: Duration::from_secs(60),
        interval: Duration::from_millis(750),
    };
    let interest = ViewGeneration::new().observe();
    let waiting = await_sandbox_idle(&api, "sb-1", &settings, &interest, |_| {})
        .await
        .unwrap();

    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].to_do_what, "send UC2 request");
}
