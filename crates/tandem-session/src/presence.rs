//! Lifecycle-driven presence tracking for the signed-in user.
//!
//! The host platform delivers foreground/background transitions in
//! order; the tracker translates them into presence writes.  Observers
//! elsewhere read another user's record through the store's live
//! presence subscription and render it with [`status_line`].

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use tandem_shared::error::Result;
use tandem_shared::time::format_last_seen;
use tandem_shared::UserId;
use tandem_store::{PresenceRecord, Store};

/// Application lifecycle transitions delivered by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    Foreground,
    Background,
}

/// Keeps one user's presence record in sync with app lifecycle events.
///
/// States: Unknown (no record yet), Online, Offline(last_seen).
/// Foreground flips online without touching `last_seen`; background and
/// teardown flip offline and stamp the transition time.
pub struct PresenceTracker {
    store: Store,
    user_id: UserId,
    listener: Option<JoinHandle<()>>,
}

impl PresenceTracker {
    /// Ensure the presence record exists (merge-upsert, online, seen now)
    /// and then begin listening for lifecycle transitions.
    pub fn start(
        store: Store,
        user_id: UserId,
        mut lifecycle: mpsc::UnboundedReceiver<AppLifecycle>,
    ) -> Result<Self> {
        store.upsert_presence(&PresenceRecord {
            user_id: user_id.clone(),
            is_online: true,
            last_seen: Some(Utc::now()),
        })?;
        info!(user = %user_id, "presence tracking started");

        let task_store = store.clone();
        let task_user = user_id.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = lifecycle.recv().await {
                let result = match event {
                    AppLifecycle::Foreground => task_store.set_online(&task_user),
                    AppLifecycle::Background => task_store.set_offline(&task_user, Utc::now()),
                };
                if let Err(e) = result {
                    error!(user = %task_user, error = %e, "presence transition write failed");
                }
            }
        });

        Ok(Self {
            store,
            user_id,
            listener: Some(listener),
        })
    }

    /// Detach the lifecycle listener and force the record offline,
    /// regardless of the current foreground state.
    pub fn stop(mut self) -> Result<()> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.store.set_offline(&self.user_id, Utc::now())?;
        info!(user = %self.user_id, "presence tracking stopped");
        Ok(())
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        // Best-effort offline flip when the tracker is torn down without
        // an explicit stop.
        if let Some(listener) = self.listener.take() {
            listener.abort();
            if let Err(e) = self.store.set_offline(&self.user_id, Utc::now()) {
                error!(user = %self.user_id, error = %e, "offline flip on drop failed");
            }
        }
    }
}

/// Render the conversation-header status for a peer's record.
///
/// "Online" while the peer is online, otherwise a bucketed
/// "Last seen ..." string, or empty when the peer was never seen.
pub fn status_line(record: &PresenceRecord, now: DateTime<Utc>) -> String {
    if record.is_online {
        return "Online".to_string();
    }
    match record.last_seen {
        Some(last_seen) => format!("Last seen {}", format_last_seen(last_seen, now)),
        None => String::new(),
    }
}
