//! Sandbox identity and configuration models
//!
//! A sandbox config is edited as a copy-on-write draft: the operator changes
//! a clone while the fetched original stays untouched, and the update is
//! submittable only when the draft differs from the original and every
//! additional header is syntactically valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::common::{Error, Result};

/// Sandbox identity as returned by the listing operations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sandbox {
    pub id: String,
    pub name: String,
    /// Whether the counterpart party can be notified/reset in this sandbox
    #[serde(default)]
    pub can_notify_party: bool,
}

/// One additional header forwarded to the external party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderEntry {
    pub header_name: String,
    pub header_value: String,
}

/// Mutable sandbox configuration owned by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxConfig {
    #[serde(default)]
    pub sandbox_id: String,
    #[serde(default)]
    pub sandbox_name: String,
    #[serde(default)]
    pub sandbox_url: String,
    #[serde(default)]
    pub sandbox_auth_header_name: String,
    #[serde(default)]
    pub sandbox_auth_header_value: String,
    #[serde(default)]
    pub external_party_url: String,
    #[serde(default)]
    pub external_party_auth_header_name: String,
    #[serde(default)]
    pub external_party_auth_header_value: String,
    #[serde(default)]
    pub external_party_additional_headers: Vec<HeaderEntry>,
    /// Optional per-endpoint URI overrides, keyed by endpoint name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub external_party_uri_overrides: HashMap<String, String>,
}

/// RFC 7230 token syntax for header names
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '.' | '^' | '_' | '`' | '|' | '~' | '-')
        })
}

/// RFC 7230 field-value syntax: HTAB, printable ASCII and obs-text
pub fn is_valid_header_value(value: &str) -> bool {
    value
        .chars()
        .all(|c| c == '\t' || ('\x20'..='\x7e').contains(&c) || ('\u{80}'..='\u{ff}').contains(&c))
}

/// Copy-on-write editing session over a fetched sandbox config
#[derive(Debug, Clone)]
pub struct SandboxConfigDraft {
    original: SandboxConfig,
    pub updated: SandboxConfig,
}

impl SandboxConfigDraft {
    /// Start a draft from the config fetched from the sandbox
    pub fn new(original: SandboxConfig) -> Self {
        let updated = original.clone();
        Self { original, updated }
    }

    /// The untouched original, for field-by-field comparison
    pub fn original(&self) -> &SandboxConfig {
        &self.original
    }

    pub fn add_header(&mut self, name: String, value: String) {
        self.updated.external_party_additional_headers.push(HeaderEntry {
            header_name: name,
            header_value: value,
        });
    }

    pub fn remove_last_header(&mut self) {
        self.updated.external_party_additional_headers.pop();
    }

    /// Whether the draft may be submitted: it must differ from the original
    /// and every additional header must be syntactically valid
    pub fn can_update(&self) -> bool {
        self.validate().is_ok() && self.updated != self.original
    }

    /// Check the header-syntax rules, pointing at the first offending field
    pub fn validate(&self) -> Result<()> {
        for header in &self.updated.external_party_additional_headers {
            if !is_valid_header_name(&header.header_name) {
                return Err(Error::InvalidHeader {
                    kind: "name",
                    value: header.header_name.clone(),
                });
            }
            if !is_valid_header_value(&header.header_value) {
                return Err(Error::InvalidHeader {
                    kind: "value",
                    value: header.header_value.clone(),
                });
            }
        }
        Ok(())
    }
}
