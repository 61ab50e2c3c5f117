//! Live queries over the database.
//!
//! [`Store`] is the shared async handle the rest of the workspace uses:
//! it serialises access to the [`Database`] behind a mutex, fans a
//! [`StoreEvent`] out to subscribers after every write, and turns standing
//! queries into snapshot streams.  Each subscription is owned by exactly
//! one caller and carries a single capability: [`Subscription::cancel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use tandem_shared::{RoomId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Message, MessageBody, PresenceRecord, ProfilePatch, Room, UserProfile};

/// Change notification fanned out to live queries after each write.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    MessagesChanged(RoomId),
    PresenceChanged(UserId),
    ProfileChanged(UserId),
}

/// Capacity of the change-notification channel.  A lagged subscriber
/// re-queries and resynchronises, so overflow only costs a redundant
/// snapshot.
const EVENT_CAPACITY: usize = 256;

/// Shared handle over the database plus the change notifier driving live
/// subscriptions.
#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Database>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            events,
        }
    }

    /// Open the default on-disk database and wrap it.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    /// Run a closure against the locked database.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&guard)
    }

    fn notify(&self, event: StoreEvent) {
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.events.send(event);
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Idempotent create-or-merge of the room record.  Called on every
    /// room entry.
    pub fn ensure_room(&self, room_id: &RoomId) -> Result<()> {
        self.with_db(|db| db.ensure_room(room_id, Utc::now()))
    }

    pub fn get_room(&self, room_id: &RoomId) -> Result<Room> {
        self.with_db(|db| db.get_room(room_id))
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    /// Append a message to a room's log, stamping the store-assigned id
    /// and timestamp, and notify subscribers.
    pub fn append_message(
        &self,
        room_id: &RoomId,
        sender: &UserProfile,
        body: MessageBody,
    ) -> Result<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            room_id: room_id.clone(),
            user_id: sender.user_id.clone(),
            sender_name: sender.name.clone(),
            profile_url: sender.profile_url.clone(),
            body,
            created_at: Utc::now(),
        };

        self.with_db(|db| db.append_message(&message))?;

        tracing::info!(message_id = %message.id, room = %room_id, "message appended");
        self.notify(StoreEvent::MessagesChanged(room_id.clone()));
        Ok(message)
    }

    pub fn messages_for_room(&self, room_id: &RoomId) -> Result<Vec<Message>> {
        self.with_db(|db| db.messages_for_room(room_id))
    }

    pub fn latest_message(&self, room_id: &RoomId) -> Result<Option<Message>> {
        self.with_db(|db| db.latest_message(room_id))
    }

    // ------------------------------------------------------------------
    // Presence
    // ------------------------------------------------------------------

    pub fn upsert_presence(&self, record: &PresenceRecord) -> Result<()> {
        self.with_db(|db| db.upsert_presence(record))?;
        self.notify(StoreEvent::PresenceChanged(record.user_id.clone()));
        Ok(())
    }

    pub fn set_online(&self, user_id: &UserId) -> Result<()> {
        self.with_db(|db| db.set_online(user_id))?;
        self.notify(StoreEvent::PresenceChanged(user_id.clone()));
        Ok(())
    }

    pub fn set_offline(&self, user_id: &UserId, last_seen: chrono::DateTime<Utc>) -> Result<()> {
        self.with_db(|db| db.set_offline(user_id, last_seen))?;
        self.notify(StoreEvent::PresenceChanged(user_id.clone()));
        Ok(())
    }

    pub fn get_presence(&self, user_id: &UserId) -> Result<PresenceRecord> {
        self.with_db(|db| db.get_presence(user_id))
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.with_db(|db| db.upsert_profile(profile))?;
        self.notify(StoreEvent::ProfileChanged(profile.user_id.clone()));
        Ok(())
    }

    pub fn get_profile(&self, user_id: &UserId) -> Result<UserProfile> {
        self.with_db(|db| db.get_profile(user_id))
    }

    pub fn update_profile(&self, user_id: &UserId, patch: &ProfilePatch) -> Result<()> {
        self.with_db(|db| db.update_profile(user_id, patch))?;
        self.notify(StoreEvent::ProfileChanged(user_id.clone()));
        Ok(())
    }

    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        self.with_db(|db| db.list_profiles())
    }

    // ------------------------------------------------------------------
    // Live subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to the full ordered message log of a room (oldest
    /// first).  The sink receives the complete snapshot immediately and
    /// again after every change.
    pub fn subscribe_messages(
        &self,
        room_id: RoomId,
        sink: mpsc::UnboundedSender<Vec<Message>>,
    ) -> Subscription {
        let room = room_id.clone();
        self.spawn_live_query(
            move |event| matches!(event, StoreEvent::MessagesChanged(r) if *r == room),
            move |store| store.messages_for_room(&room_id).map(Some),
            sink,
        )
    }

    /// Subscribe to the newest message of a room for preview rendering.
    ///
    /// `None` snapshots mean the room has resolved to empty, which is
    /// distinct from a subscription that has not delivered yet.
    pub fn subscribe_latest(
        &self,
        room_id: RoomId,
        sink: mpsc::UnboundedSender<Option<Message>>,
    ) -> Subscription {
        let room = room_id.clone();
        self.spawn_live_query(
            move |event| matches!(event, StoreEvent::MessagesChanged(r) if *r == room),
            move |store| store.latest_message(&room_id).map(Some),
            sink,
        )
    }

    /// Subscribe to another user's presence record.  Nothing is delivered
    /// until the record exists.
    pub fn subscribe_presence(
        &self,
        user_id: UserId,
        sink: mpsc::UnboundedSender<PresenceRecord>,
    ) -> Subscription {
        let user = user_id.clone();
        self.spawn_live_query(
            move |event| matches!(event, StoreEvent::PresenceChanged(u) if *u == user),
            move |store| match store.get_presence(&user_id) {
                Ok(record) => Ok(Some(record)),
                Err(StoreError::NotFound) => Ok(None),
                Err(e) => Err(e),
            },
            sink,
        )
    }

    /// Common scaffolding: deliver the initial snapshot, then re-query on
    /// every matching event until cancelled or the sink closes.
    ///
    /// The store does not deduplicate overlapping subscriptions; each
    /// call spawns its own delivery task.
    fn spawn_live_query<T, M, Q>(
        &self,
        matches: M,
        query: Q,
        sink: mpsc::UnboundedSender<T>,
    ) -> Subscription
    where
        T: Send + 'static,
        M: Fn(&StoreEvent) -> bool + Send + 'static,
        Q: Fn(&Store) -> Result<Option<T>> + Send + 'static,
    {
        let store = self.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let mut events = self.events.subscribe();

        let task = tokio::spawn(async move {
            if !deliver(&store, &query, &sink) {
                return;
            }

            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "live query lagged, resynchronising");
                        if !deliver(&store, &query, &sink) {
                            break;
                        }
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if matches(&event) && !deliver(&store, &query, &sink) {
                    break;
                }
            }
        });

        Subscription { cancelled, task }
    }
}

/// Run one query and push the snapshot.  Returns `false` when the sink is
/// gone and the task should stop.  Query failures are logged and the
/// subscription stays alive.
fn deliver<T>(
    store: &Store,
    query: &(impl Fn(&Store) -> Result<Option<T>> + Send),
    sink: &mpsc::UnboundedSender<T>,
) -> bool {
    match query(store) {
        Ok(Some(snapshot)) => sink.send(snapshot).is_ok(),
        Ok(None) => true,
        Err(e) => {
            tracing::error!(error = %e, "live query failed");
            true
        }
    }
}

/// Handle to a live query.
///
/// Its sole capability is [`cancel`](Self::cancel); cancelling twice is
/// safe and no snapshot is delivered after the first call.  Dropping the
/// handle cancels the query.
pub struct Subscription {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
