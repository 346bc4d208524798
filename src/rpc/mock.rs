//! Scripted in-process gateway for tests
//!
//! Stands in for a live sandbox in unit and integration tests: responders
//! are registered per operation name, every call is recorded, and queued
//! responses are consumed in order so multi-step flows can be scripted.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::common::{Error, Result};

use super::gateway::Gateway;

type Responder = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: String,
    pub params: Value,
}

/// Test double implementing [`Gateway`] from a script
#[derive(Default)]
pub struct ScriptedGateway {
    responders: Mutex<HashMap<String, Vec<Responder>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a fixed response for the next call to `operation`. Responses
    /// queue in registration order; the last one is reused once the queue
    /// would run dry.
    pub fn respond(&self, operation: &str, body: Value) {
        self.respond_with(operation, move |_| Ok(body.clone()));
    }

    /// Queue a responder closure, e.g. to assert on parameters or to flip
    /// shared state mid-flow
    pub fn respond_with(
        &self,
        operation: &str,
        responder: impl Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    ) {
        self.responders
            .lock()
            .unwrap()
            .entry(operation.to_string())
            .or_default()
            .push(Box::new(responder));
    }

    /// All calls issued so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls issued for one operation
    pub fn calls_for(&self, operation: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn call(&self, operation: &str, params: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation: operation.to_string(),
            params: params.clone(),
        });

        let mut responders = self.responders.lock().unwrap();
        let queue = responders.get_mut(operation).ok_or_else(|| {
            Error::Transport(format!("no scripted response for operation '{operation}'"))
        })?;
        let responder = if queue.len() > 1 {
            queue.remove(0)
        } else {
            return queue[0](&params);
        };
        responder(&params)
    }
}
