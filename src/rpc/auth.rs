//! Identity token providers and authentication state
//!
//! The token is an opaque bearer credential attached to every gateway call
//! when available. Anonymous calls are a valid state at this layer; the
//! server decides whether to reject them. Authentication state is exposed as
//! a single subscribable boolean signal instead of ambient mutable fields.

use async_trait::async_trait;
use tokio::sync::watch;

/// Source of the opaque identity token
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current token, or None for an anonymous call
    async fn token(&self) -> Option<String>;
}

/// Fixed token taken from configuration or the environment
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl IdentityProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// No identity; every call is anonymous
pub struct Anonymous;

#[async_trait]
impl IdentityProvider for Anonymous {
    async fn token(&self) -> Option<String> {
        None
    }
}

/// Subscribable authenticated-or-not signal
pub struct AuthState {
    tx: watch::Sender<bool>,
}

impl AuthState {
    pub fn new(authenticated: bool) -> Self {
        let (tx, _) = watch::channel(authenticated);
        Self { tx }
    }

    pub fn is_authenticated(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        // subscribers are woken on actual transitions only; the state is
        // valid with no subscribers at all
        self.tx.send_if_modified(|current| {
            if *current != authenticated {
                *current = authenticated;
                true
            } else {
                false
            }
        });
    }

    /// Subscribe to authentication changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
