//! Remote operation gateway
//!
//! Every domain operation is one named call over a single physical channel:
//! an operation name plus a JSON payload in, and either the raw result value
//! or an `{"error": "..."}` envelope back. That envelope is the only
//! error-signaling mechanism the core relies on; transport status codes are
//! never the source of truth.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::model::{
    ModuleDigest, Sandbox, SandboxConfig, SandboxStatus, ScenarioDigest, ScenarioStatus,
};

/// The single request/response channel the core depends on
///
/// Implementations return the raw response body; callers map `{error}`
/// envelopes through [`decode_envelope`]. Transport failures must already be
/// normalized to [`Error::Transport`] by the implementation.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn call(&self, operation: &str, params: Value) -> Result<Value>;
}

/// Map a raw response body to the operation result, surfacing `{error}`
/// envelopes as protocol errors
pub fn decode_envelope(operation: &str, body: Value) -> Result<Value> {
    if let Some(object) = body.as_object() {
        if let Some(message) = object.get("error").and_then(Value::as_str) {
            return Err(Error::operation(operation, message));
        }
    }
    Ok(body)
}

/// Typed facade over the gateway, one method per remote operation
#[derive(Clone)]
pub struct ConformanceApi {
    gateway: Arc<dyn Gateway>,
}

impl ConformanceApi {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Issue one operation and parse the (envelope-decoded) result
    async fn invoke<T: DeserializeOwned>(&self, operation: &str, params: Value) -> Result<T> {
        let body = self.gateway.call(operation, params).await?;
        let result = decode_envelope(operation, body)?;
        serde_json::from_value(result)
            .map_err(|e| Error::unexpected_response(operation, &e.to_string()))
    }

    /// Issue one operation, ignoring the result value
    async fn invoke_void(&self, operation: &str, params: Value) -> Result<()> {
        let body = self.gateway.call(operation, params).await?;
        decode_envelope(operation, body)?;
        Ok(())
    }

    pub async fn get_all_sandboxes(&self) -> Result<Vec<Sandbox>> {
        self.invoke("getAllSandboxes", json!({})).await
    }

    pub async fn get_sandbox(&self, sandbox_id: &str) -> Result<Sandbox> {
        self.invoke("getSandbox", json!({"sandboxId": sandbox_id}))
            .await
    }

    pub async fn get_sandbox_status(&self, sandbox_id: &str) -> Result<SandboxStatus> {
        self.invoke("getSandboxStatus", json!({"sandboxId": sandbox_id}))
            .await
    }

    pub async fn get_scenario_digests(&self, sandbox_id: &str) -> Result<Vec<ModuleDigest>> {
        self.invoke("getScenarioDigests", json!({"sandboxId": sandbox_id}))
            .await
    }

    pub async fn get_scenario(
        &self,
        sandbox_id: &str,
        scenario_id: &str,
    ) -> Result<ScenarioDigest> {
        self.invoke(
            "getScenario",
            json!({"sandboxId": sandbox_id, "scenarioId": scenario_id}),
        )
        .await
    }

    pub async fn get_scenario_status(
        &self,
        sandbox_id: &str,
        scenario_id: &str,
    ) -> Result<ScenarioStatus> {
        self.invoke(
            "getScenarioStatus",
            json!({"sandboxId": sandbox_id, "scenarioId": scenario_id}),
        )
        .await
    }

    pub async fn start_or_stop_scenario(
        &self,
        sandbox_id: &str,
        scenario_id: &str,
    ) -> Result<()> {
        self.invoke_void(
            "startOrStopScenario",
            json!({"sandboxId": sandbox_id, "scenarioId": scenario_id}),
        )
        .await
    }

    /// Submit operator action input. `action_input` must be absent (not an
    /// empty string) for acknowledgement-only submissions.
    pub async fn handle_action_input(
        &self,
        sandbox_id: &str,
        scenario_id: &str,
        action_id: &str,
        action_input: Option<Value>,
    ) -> Result<Value> {
        let mut params = json!({
            "sandboxId": sandbox_id,
            "scenarioId": scenario_id,
            "actionId": action_id,
        });
        if let Some(input) = action_input {
            params["actionInput"] = input;
        }
        self.invoke("handleActionInput", params).await
    }

    /// Mark the current action complete, or skip it. `skip` is always sent
    /// explicitly; `skip=true` and `skip=false` are distinct requests.
    pub async fn complete_current_action(&self, sandbox_id: &str, skip: bool) -> Result<()> {
        self.invoke_void(
            "completeCurrentAction",
            json!({"sandboxId": sandbox_id, "skip": skip}),
        )
        .await
    }

    /// Opaque exchange log of the current action, for operator inspection
    pub async fn get_current_action_exchanges(
        &self,
        sandbox_id: &str,
        scenario_id: &str,
    ) -> Result<Value> {
        self.invoke(
            "getCurrentActionExchanges",
            json!({"sandboxId": sandbox_id, "scenarioId": scenario_id}),
        )
        .await
    }

    pub async fn get_sandbox_config(&self, sandbox_id: &str) -> Result<SandboxConfig> {
        self.invoke("getSandboxConfig", json!({"sandboxId": sandbox_id}))
            .await
    }

    pub async fn update_sandbox_config(&self, config: &SandboxConfig) -> Result<()> {
        let params = serde_json::to_value(config)?;
        self.invoke_void("updateSandboxConfig", params).await
    }

    pub async fn notify_party(&self, sandbox_id: &str) -> Result<()> {
        self.invoke_void("notifyParty", json!({"sandboxId": sandbox_id}))
            .await
    }

    pub async fn reset_party(&self, sandbox_id: &str) -> Result<()> {
        self.invoke_void("resetParty", json!({"sandboxId": sandbox_id}))
            .await
    }
}
