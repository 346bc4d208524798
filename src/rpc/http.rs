//! HTTP implementation of the remote operation gateway

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::common::{Error, Result};

use super::auth::{AuthState, IdentityProvider};
use super::gateway::Gateway;

/// Gateway speaking the single-endpoint JSON protocol over HTTP
///
/// Each call POSTs `{"operation": <name>, ...params}` to the configured
/// endpoint. An identity token, when the provider yields one, is attached as
/// an `Authorization` header; otherwise the call goes out anonymous. The
/// shared [`AuthState`] signal tracks whether the sandbox accepted the last
/// call's credentials.
pub struct HttpGateway {
    client: reqwest::Client,
    api_url: String,
    identity: Arc<dyn IdentityProvider>,
    auth: Arc<AuthState>,
}

impl HttpGateway {
    pub fn new(
        api_url: impl Into<String>,
        identity: Arc<dyn IdentityProvider>,
        auth: Arc<AuthState>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            identity,
            auth,
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn call(&self, operation: &str, params: Value) -> Result<Value> {
        // merge the operation name into the payload envelope
        let mut body = json!({"operation": operation});
        if let (Some(envelope), Some(fields)) = (body.as_object_mut(), params.as_object()) {
            for (key, value) in fields {
                envelope.insert(key.clone(), value.clone());
            }
        }

        tracing::debug!(operation, "issuing remote operation");

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(token) = self.identity.token().await {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }

        // Transport failures are normalized here so the controller sees a
        // single error path; the `{error}` envelope is decoded by the caller.
        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            self.auth.set_authenticated(false);
            return Err(Error::Transport(format!(
                "{operation}: rejected with status {status}"
            )));
        }
        self.auth.set_authenticated(true);
        let value = response
            .json::<Value>()
            .await
            .map_err(|e| Error::Transport(format!("{operation}: invalid response body: {e}")))?;

        tracing::trace!(operation, %value, "remote operation response");
        Ok(value)
    }
}
