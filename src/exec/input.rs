//! Action input codec
//!
//! Decides once per status load whether the pending action expects free text
//! or a structured JSON value, and encodes the operator's raw text
//! accordingly. A JSON parse failure is a local validation error: it never
//! reaches the gateway and the typed text stays untouched for in-place
//! correction.

use serde_json::Value;

use crate::common::{Error, Result};
use crate::model::ScenarioStatus;

/// Kind of input the pending action expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionInputKind {
    /// Trimmed text submitted verbatim as a string
    #[default]
    FreeText,
    /// Text parsed as JSON before submission
    StructuredJson,
}

impl ActionInputKind {
    /// Decide the kind from a freshly loaded status. The presence of
    /// `jsonForPromptText` signals a JSON-expecting action.
    pub fn for_status(status: &ScenarioStatus) -> Self {
        if status.json_for_prompt_text.is_some() {
            Self::StructuredJson
        } else {
            Self::FreeText
        }
    }
}

/// Pre-seed the input buffer for a freshly loaded status: the pretty-printed
/// prompt JSON when present, otherwise blank
pub fn seed_buffer(status: &ScenarioStatus) -> String {
    match &status.json_for_prompt_text {
        Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
        None => String::new(),
    }
}

/// Encode raw operator text for submission
///
/// `with_input == false` is the explicit acknowledgement-only path: it
/// yields an absent payload, never an empty string. Free text is never
/// JSON-parsed, even when it happens to be valid JSON.
pub fn encode(kind: ActionInputKind, raw: &str, with_input: bool) -> Result<Option<Value>> {
    if !with_input {
        return Ok(None);
    }
    match kind {
        ActionInputKind::FreeText => Ok(Some(Value::String(raw.trim().to_string()))),
        ActionInputKind::StructuredJson => serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| Error::InvalidInput(e.to_string())),
    }
}
