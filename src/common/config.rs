//! Configuration file handling

use serde::Deserialize;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Remote endpoint settings
    #[serde(default)]
    pub endpoint: Endpoint,

    /// Identity settings
    #[serde(default)]
    pub identity: Identity,

    /// Sandbox status polling settings
    #[serde(default)]
    pub polling: Polling,
}

/// Remote endpoint settings
#[derive(Debug, Deserialize)]
pub struct Endpoint {
    /// URL of the conformance webui API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080/conformance/webui".to_string()
}

/// Identity settings
///
/// The token is attached verbatim as an `Authorization` header. Absence is
/// a valid anonymous state; the server decides whether anonymous calls are
/// acceptable.
#[derive(Debug, Deserialize, Default)]
pub struct Identity {
    /// Opaque identity token. `CONFORMANCE_TOKEN` overrides this at runtime.
    #[serde(default)]
    pub token: Option<String>,
}

/// Sandbox status polling settings
#[derive(Debug, Deserialize)]
pub struct Polling {
    /// Wall-clock budget for waiting on a busy sandbox, in seconds
    #[serde(default = "default_budget")]
    pub budget_secs: u64,

    /// Sleep between polling iterations, in milliseconds
    #[serde(default = "default_interval")]
    pub interval_millis: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            budget_secs: default_budget(),
            interval_millis: default_interval(),
        }
    }
}

fn default_budget() -> u64 {
    60
}
fn default_interval() -> u64 {
    750
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if the file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file, defaulting when it is absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Identity token, with environment override
    pub fn token(&self) -> Option<String> {
        std::env::var("CONFORMANCE_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.identity.token.clone())
    }
}
