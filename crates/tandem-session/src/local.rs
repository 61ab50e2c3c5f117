//! In-memory auth provider.
//!
//! Useful for tests and for embedding without a remote identity service.
//! It reports failures with the same machine codes a hosted provider
//! would, so the session's error normalization is exercised end to end.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;
use uuid::Uuid;

use tandem_shared::UserId;

use crate::auth::{AuthProvider, Credential, ProviderError};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

struct AccountRecord {
    user_id: UserId,
    password: String,
}

/// In-memory [`AuthProvider`] keyed by email address.
pub struct LocalAuthProvider {
    accounts: DashMap<String, AccountRecord>,
    state: watch::Sender<Option<Credential>>,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            state,
        }
    }

    fn validate_email(email: &str) -> Result<(), ProviderError> {
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(ProviderError::new(
                "invalid-email",
                "The email address is badly formatted",
            ));
        }
        Ok(())
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Credential, ProviderError> {
        Self::validate_email(email)?;

        let account = self.accounts.get(email).ok_or_else(|| {
            ProviderError::new(
                "invalid-credential",
                "The supplied credential is incorrect or has expired",
            )
        })?;

        if account.password != password {
            return Err(ProviderError::new(
                "invalid-credential",
                "The supplied credential is incorrect or has expired",
            ));
        }

        let credential = Credential {
            user_id: account.user_id.clone(),
            email: email.to_string(),
        };
        drop(account);

        // send_replace keeps current() accurate even with no watchers.
        self.state.send_replace(Some(credential.clone()));
        tracing::info!(user = %credential.user_id, "signed in");
        Ok(credential)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Credential, ProviderError> {
        Self::validate_email(email)?;

        if password.len() < MIN_PASSWORD_LEN {
            return Err(ProviderError::new(
                "weak-password",
                "Password should be at least 6 characters",
            ));
        }
        if self.accounts.contains_key(email) {
            return Err(ProviderError::new(
                "email-already-in-use",
                "The email address is already in use by another account",
            ));
        }

        let user_id = UserId(format!("uid-{}", Uuid::new_v4().simple()));
        self.accounts.insert(
            email.to_string(),
            AccountRecord {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );

        let credential = Credential {
            user_id,
            email: email.to_string(),
        };

        // As with hosted providers, a fresh registration signs the user in.
        self.state.send_replace(Some(credential.clone()));
        tracing::info!(user = %credential.user_id, "account created");
        Ok(credential)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn current(&self) -> Option<Credential> {
        self.state.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Credential>> {
        self.state.subscribe()
    }
}
