//! Scenario execution core: status poller, input codec, controller

pub mod controller;
pub mod input;
pub mod poller;

pub use controller::{ControllerState, ScenarioController};
pub use input::{encode, seed_buffer, ActionInputKind};
pub use poller::{await_sandbox_idle, PollSettings};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation counter tying in-flight calls to the view that issued them
///
/// Navigating away bumps the generation; results observed under an older
/// generation are discarded instead of being applied to a stale view. The
/// poller and the controller share this one cancellation mechanism.
#[derive(Clone, Debug, Default)]
pub struct ViewGeneration(Arc<AtomicU64>);

impl ViewGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every outstanding interest
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Capture the current generation for one logical operation
    pub fn observe(&self) -> Interest {
        Interest {
            generation: self.clone(),
            seen: self.0.load(Ordering::SeqCst),
        }
    }
}

/// A captured generation; stale once the view moved on
#[derive(Clone, Debug)]
pub struct Interest {
    generation: ViewGeneration,
    seen: u64,
}

impl Interest {
    pub fn is_stale(&self) -> bool {
        self.generation.0.load(Ordering::SeqCst) != self.seen
    }
}
