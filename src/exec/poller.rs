//! Sandbox status poller
//!
//! Before presenting or acting on scenario status, wait for the sandbox to
//! stop being blocked on an external party, so the operator is not shown a
//! stale "idle" view while traffic is in flight. The wait is a bounded timed
//! loop, not an infinite spin: a stuck external party must not hang the
//! operator's view forever.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::common::Result;
use crate::model::WaitingEntry;
use crate::rpc::ConformanceApi;

use super::Interest;

/// Budget and cadence of the bounded wait
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Wall-clock budget since the first status call
    pub budget: Duration,
    /// Sleep between iterations
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(60),
            interval: Duration::from_millis(750),
        }
    }
}

impl PollSettings {
    pub fn from_config(polling: &crate::common::config::Polling) -> Self {
        Self {
            budget: Duration::from_secs(polling.budget_secs),
            interval: Duration::from_millis(polling.interval_millis),
        }
    }
}

/// Poll `getSandboxStatus` until the sandbox is idle or the budget elapses
///
/// Each iteration's waiting entries are handed to `on_waiting` as they
/// arrive, never batched. On budget exhaustion the last-seen waiting list is
/// returned as an informational value; the caller proceeds to read scenario
/// status regardless. A bumped `interest` aborts the loop with
/// [`crate::common::Error::Stale`] so late results are dropped, sharing one
/// cancellation mechanism with navigation-away.
pub async fn await_sandbox_idle(
    api: &ConformanceApi,
    sandbox_id: &str,
    settings: &PollSettings,
    interest: &Interest,
    mut on_waiting: impl FnMut(&[WaitingEntry]),
) -> Result<Vec<WaitingEntry>> {
    let deadline = Instant::now() + settings.budget;

    loop {
        let status = api.get_sandbox_status(sandbox_id).await?;
        if interest.is_stale() {
            return Err(crate::common::Error::Stale);
        }

        if status.is_idle() {
            tracing::debug!(sandbox_id, "sandbox is idle");
            return Ok(Vec::new());
        }

        for entry in &status.waiting {
            tracing::info!(sandbox_id, %entry, "sandbox busy");
        }
        on_waiting(&status.waiting);

        if Instant::now() >= deadline {
            tracing::warn!(
                sandbox_id,
                budget_secs = settings.budget.as_secs(),
                "sandbox still busy after poll budget, proceeding anyway"
            );
            return Ok(status.waiting);
        }

        sleep(settings.interval).await;
    }
}
