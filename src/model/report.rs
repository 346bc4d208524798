//! Recursive conformance report tree
//!
//! Reports are received wholesale from the sandbox and replaced on every
//! refresh. The parent status is computed upstream from the children; this
//! client displays exactly what it receives and never rolls statuses up
//! locally.

use serde::Deserialize;
use std::fmt::Write;

use super::ConformanceStatus;

/// One node of the hierarchical pass/fail report
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    pub title: String,
    #[serde(rename = "conformanceStatus")]
    pub status: ConformanceStatus,
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub sub_reports: Vec<ConformanceReport>,
}

impl ConformanceReport {
    /// Render the report tree as indented text, one node per block
    ///
    /// Pure traversal: glyph + title from the status metadata, error
    /// messages one per line, then the sub-reports two spaces deeper.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = writeln!(
            out,
            "{indent}{} {} [{}]",
            self.status.glyph(),
            self.title,
            self.status.title()
        );
        for message in &self.error_messages {
            let _ = writeln!(out, "{indent}  ! {message}");
        }
        for sub in &self.sub_reports {
            sub.render_into(out, depth + 1);
        }
    }

    /// Total number of nodes in the tree, this one included
    pub fn node_count(&self) -> usize {
        1 + self.sub_reports.iter().map(Self::node_count).sum::<usize>()
    }
}
