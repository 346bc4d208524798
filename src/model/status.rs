//! Conformance status categories and their display metadata

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::common::Error;

/// Outcome category of a conformance evaluation
///
/// Closed set. Unknown wire strings fail deserialization rather than being
/// mapped to a default category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConformanceStatus {
    Conformant,
    NonConformant,
    PartiallyConformant,
    NoTraffic,
    Irrelevant,
}

impl ConformanceStatus {
    /// Display glyph for this status
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Conformant => "✅",
            Self::NonConformant => "🚫",
            Self::PartiallyConformant => "⚠️",
            Self::NoTraffic => "❔",
            Self::Irrelevant => "➖",
        }
    }

    /// Display title for this status
    pub fn title(&self) -> &'static str {
        match self {
            Self::Conformant => "Conformant",
            Self::NonConformant => "Non-conformant",
            Self::PartiallyConformant => "Partially conformant",
            Self::NoTraffic => "No traffic",
            Self::Irrelevant => "Irrelevant",
        }
    }

    /// All statuses, for exhaustive display checks
    pub const ALL: [Self; 5] = [
        Self::Conformant,
        Self::NonConformant,
        Self::PartiallyConformant,
        Self::NoTraffic,
        Self::Irrelevant,
    ];

    /// Whether a scenario with this status has recorded traffic that a
    /// restart would discard
    pub fn has_traffic(&self) -> bool {
        matches!(
            self,
            Self::Conformant | Self::NonConformant | Self::PartiallyConformant
        )
    }
}

impl FromStr for ConformanceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFORMANT" => Ok(Self::Conformant),
            "NON_CONFORMANT" => Ok(Self::NonConformant),
            "PARTIALLY_CONFORMANT" => Ok(Self::PartiallyConformant),
            "NO_TRAFFIC" => Ok(Self::NoTraffic),
            "IRRELEVANT" => Ok(Self::Irrelevant),
            other => Err(Error::InvalidInput(format!(
                "unknown conformance status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for ConformanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}
