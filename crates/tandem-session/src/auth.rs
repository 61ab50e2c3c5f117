//! The auth provider seam.
//!
//! Credential management is an external collaborator; the session only
//! needs sign-in/up/out, a current-credential lookup, and a stream of
//! auth-state changes.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use tandem_shared::UserId;

/// A signed-in credential as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: UserId,
    pub email: String,
}

/// Raw provider failure.
///
/// `code` is the provider's machine-readable reason (`invalid-email`,
/// `invalid-credential`, `email-already-in-use`, `weak-password`, ...);
/// the session normalizes known codes into user-facing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Credential sign-in/sign-up/sign-out plus auth-state-changed
/// notifications.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, ProviderError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credential, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// The currently signed-in credential, if any.
    fn current(&self) -> Option<Credential>;

    /// Watch credential changes.  The receiver observes the current value
    /// immediately and every change afterwards.
    fn watch(&self) -> watch::Receiver<Option<Credential>>;
}
