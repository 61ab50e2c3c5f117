//! The process-wide authenticated-identity state.
//!
//! [`Session`] is an explicitly owned object handed to the screens that
//! need it, not an ambient global.  It starts `Unknown` (the embedding
//! UI shows a loading indicator), resolves to `SignedOut` or
//! `SignedIn` once the provider reports, and publishes every change over
//! a `watch` channel.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use tandem_shared::error::Result;
use tandem_shared::{AuthError, TandemError, UserId};
use tandem_store::{PresenceRecord, ProfilePatch, Store, UserProfile};

use crate::auth::{AuthProvider, Credential};

/// Session state, published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not reported yet; render a loading indicator.
    Unknown,
    SignedOut,
    SignedIn(UserProfile),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Owns the credential lifecycle and the hydrated profile of the
/// signed-in user.
pub struct Session {
    provider: Arc<dyn AuthProvider>,
    store: Store,
    state: Arc<watch::Sender<SessionState>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    pub fn new(provider: Arc<dyn AuthProvider>, store: Store) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            provider,
            store,
            state: Arc::new(state),
            watcher: Mutex::new(None),
        }
    }

    /// Begin following provider auth-state changes.
    ///
    /// Resolves the initial `Unknown` state from the provider's current
    /// credential, then re-hydrates on every change.  This is the
    /// one-shot classification gating the app's screen stacks.
    pub fn start(&self) {
        let mut rx = self.provider.watch();
        let store = self.store.clone();
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            apply_credential(&store, &state, initial.as_ref());

            while rx.changed().await.is_ok() {
                let credential = rx.borrow_and_update().clone();
                apply_credential(&store, &state, credential.as_ref());
            }
        });

        if let Ok(mut guard) = self.watcher.lock() {
            if let Some(old) = guard.replace(task) {
                old.abort();
            }
        }
    }

    /// Watch session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The signed-in user's profile, or [`TandemError::NotSignedIn`].
    pub fn current_profile(&self) -> Result<UserProfile> {
        match self.state() {
            SessionState::SignedIn(profile) => Ok(profile),
            _ => Err(TandemError::NotSignedIn),
        }
    }

    /// Sign in and hydrate the stored profile.
    ///
    /// Provider errors come back normalized: `invalid-email` reads
    /// "Invalid email" and `invalid-credential` reads "Invalid
    /// Credentials"; unrecognized codes pass their raw message through.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let credential = self
            .provider
            .sign_in(email, password)
            .await
            .map_err(|e| AuthError::normalized(&e.code, &e.message))?;

        let profile = hydrate(&self.store, &credential);
        self.state.send_replace(SessionState::SignedIn(profile.clone()));
        info!(user = %profile.user_id, "login succeeded");
        Ok(profile)
    }

    /// Register a new account, then write the profile document and the
    /// initial (offline) presence record.
    ///
    /// The two store writes are independent: if the presence write fails
    /// the error is surfaced, but the account and profile stand.  There
    /// is no compensating rollback.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        profile_url: &str,
    ) -> Result<UserProfile> {
        let credential = self
            .provider
            .sign_up(email, password)
            .await
            .map_err(|e| AuthError::normalized(&e.code, &e.message))?;

        let profile = UserProfile {
            user_id: credential.user_id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            profile_url: profile_url.to_string(),
            phone: None,
            location: None,
            occupation: None,
            created_at: Utc::now(),
        };
        self.store.upsert_profile(&profile)?;

        self.state.send_replace(SessionState::SignedIn(profile.clone()));
        info!(user = %profile.user_id, "account registered");

        let presence = PresenceRecord {
            user_id: credential.user_id,
            is_online: false,
            last_seen: Some(Utc::now()),
        };
        if let Err(e) = self.store.upsert_presence(&presence) {
            error!(error = %e, "initial presence write failed after registration");
            return Err(e.into());
        }

        Ok(profile)
    }

    /// Sign out and clear local state.
    ///
    /// Never panics past its own boundary; provider failures come back as
    /// a structured error and leave the current state untouched.
    pub async fn logout(&self) -> std::result::Result<(), AuthError> {
        self.provider
            .sign_out()
            .await
            .map_err(|e| AuthError::normalized(&e.code, &e.message))?;

        self.state.send_replace(SessionState::SignedOut);
        info!("logged out");
        Ok(())
    }

    /// Merge a partial update into the stored profile, then into the
    /// local cached state.
    ///
    /// Fails fast with [`TandemError::NotSignedIn`] when no user is
    /// authenticated; the local cache is only updated after the remote
    /// write confirms, so a failed write cannot desync the two.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<UserProfile> {
        let mut profile = self.current_profile()?;

        self.store.update_profile(&profile.user_id, &patch)?;

        patch.apply_to(&mut profile);
        self.state.send_replace(SessionState::SignedIn(profile.clone()));
        Ok(profile)
    }

    pub fn current_user_id(&self) -> Result<UserId> {
        Ok(self.current_profile()?.user_id)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.watcher.lock() {
            if let Some(task) = guard.take() {
                task.abort();
            }
        }
    }
}

fn apply_credential(
    store: &Store,
    state: &watch::Sender<SessionState>,
    credential: Option<&Credential>,
) {
    let next = match credential {
        Some(credential) => SessionState::SignedIn(hydrate(store, credential)),
        None => SessionState::SignedOut,
    };
    // send_replace stores the value even with no receivers; state() reads
    // must see it whether or not anyone holds a subscription.
    state.send_replace(next);
}

/// Fetch the stored profile for a credential, falling back to the bare
/// credential identity when the document is missing.
fn hydrate(store: &Store, credential: &Credential) -> UserProfile {
    match store.get_profile(&credential.user_id) {
        Ok(profile) => profile,
        Err(e) => {
            warn!(user = %credential.user_id, error = %e, "profile hydration fell back to credential");
            UserProfile {
                user_id: credential.user_id.clone(),
                name: String::new(),
                email: credential.email.clone(),
                profile_url: String::new(),
                phone: None,
                location: None,
                occupation: None,
                created_at: Utc::now(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalAuthProvider;
    use tandem_store::Database;

    fn open_session() -> (Session, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let store = Store::new(db);
        let provider = Arc::new(LocalAuthProvider::new());
        (Session::new(provider, store), dir)
    }

    #[tokio::test]
    async fn starts_unknown_then_resolves_signed_out() {
        let (session, _dir) = open_session();
        assert_eq!(session.state(), SessionState::Unknown);

        session.start();
        let mut rx = session.subscribe();
        rx.wait_for(|s| *s == SessionState::SignedOut).await.unwrap();
    }

    #[tokio::test]
    async fn state_is_visible_without_any_subscriber() {
        let (session, _dir) = open_session();

        // No subscribe() receiver is ever taken; state() must still see
        // every transition.
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();
        assert!(session.state().is_authenticated());
        assert!(session.current_profile().is_ok());

        session.logout().await.unwrap();
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn register_hydrates_profile_and_writes_offline_presence() {
        let (session, _dir) = open_session();

        let profile = session
            .register("alice@example.com", "hunter22", "Alice", "https://a.png")
            .await
            .unwrap();
        assert_eq!(profile.name, "Alice");
        assert!(session.state().is_authenticated());

        let presence = session
            .store
            .get_presence(&profile.user_id)
            .expect("presence record created at registration");
        assert!(!presence.is_online);
        assert!(presence.last_seen.is_some());
    }

    #[tokio::test]
    async fn register_duplicate_email_reads_user_already_exists() {
        let (session, _dir) = open_session();
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();

        let err = session
            .register("alice@example.com", "hunter23", "Alice 2", "")
            .await
            .unwrap_err();
        match err {
            TandemError::Auth(auth) => assert_eq!(auth.message, "User already exists"),
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[tokio::test]
    async fn login_with_malformed_email_reads_invalid_email() {
        let (session, _dir) = open_session();
        let err = session.login("not-an-email", "whatever").await.unwrap_err();
        match err {
            TandemError::Auth(auth) => assert_eq!(auth.message, "Invalid email"),
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[tokio::test]
    async fn login_with_wrong_password_reads_invalid_credentials() {
        let (session, _dir) = open_session();
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();
        session.logout().await.unwrap();

        let err = session
            .login("alice@example.com", "wrong-password")
            .await
            .unwrap_err();
        match err {
            TandemError::Auth(auth) => assert_eq!(auth.message, "Invalid Credentials"),
            other => panic!("expected auth error, got {other}"),
        }
    }

    #[tokio::test]
    async fn logout_clears_state() {
        let (session, _dir) = open_session();
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();

        session.logout().await.unwrap();
        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(session.current_profile().is_err());
    }

    #[tokio::test]
    async fn update_profile_requires_authentication() {
        let (session, _dir) = open_session();
        let err = session
            .update_profile(ProfilePatch {
                name: Some("Ghost".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TandemError::NotSignedIn));
    }

    #[tokio::test]
    async fn update_profile_merges_remote_then_local() {
        let (session, _dir) = open_session();
        session
            .register("alice@example.com", "hunter22", "Alice", "")
            .await
            .unwrap();

        let updated = session
            .update_profile(ProfilePatch {
                occupation: Some("Engineer".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.occupation.as_deref(), Some("Engineer"));

        // Remote and local agree.
        let stored = session.store.get_profile(&updated.user_id).unwrap();
        assert_eq!(stored.occupation.as_deref(), Some("Engineer"));
        match session.state() {
            SessionState::SignedIn(profile) => {
                assert_eq!(profile.occupation.as_deref(), Some("Engineer"));
            }
            other => panic!("expected signed-in state, got {other:?}"),
        }
    }
}
