//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to an embedding UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tandem_shared::{MediaCategory, RoomId, UserId};

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// A registered user's profile document.
///
/// Created at registration, mutated through partial updates, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable identifier assigned by the auth provider.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Email address the account was registered with.
    pub email: String,
    /// Avatar image URL.
    pub profile_url: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
    /// When the profile document was first written.
    pub created_at: DateTime<Utc>,
}

/// Partial profile update.  `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub profile_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.profile_url.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.occupation.is_none()
    }

    /// Merge the patch into an in-memory profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(ref name) = self.name {
            profile.name = name.clone();
        }
        if let Some(ref url) = self.profile_url {
            profile.profile_url = url.clone();
        }
        if let Some(ref phone) = self.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(ref location) = self.location {
            profile.location = Some(location.clone());
        }
        if let Some(ref occupation) = self.occupation {
            profile.occupation = Some(occupation.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// The conversation container shared by exactly two participants.
///
/// Implicitly created the first time a pair opens a conversation and
/// idempotently re-declared on every entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub room_id: RoomId,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Message payload variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Text {
        text: String,
    },
    File {
        /// Original file name.
        file_name: String,
        /// MIME type as reported when the file was picked.
        file_type: String,
        /// Size in bytes.
        file_size: i64,
        /// Download URL returned by blob storage after upload.
        file_url: String,
    },
}

impl MessageBody {
    /// Display category of an attachment, `None` for plain text.
    pub fn category(&self) -> Option<MediaCategory> {
        match self {
            Self::Text { .. } => None,
            Self::File { file_type, .. } => Some(MediaCategory::from_mime(file_type)),
        }
    }
}

/// A single chat message.  The per-room log is append-only: no edit, no
/// delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message identifier, assigned by the store.
    pub id: Uuid,
    /// The room this message belongs to.
    pub room_id: RoomId,
    /// Sender's user id.
    pub user_id: UserId,
    /// Sender's display name, denormalised at send time.
    pub sender_name: String,
    /// Sender's avatar URL, denormalised at send time.
    pub profile_url: String,
    pub body: MessageBody,
    /// Store-assigned timestamp; messages within a room are totally
    /// ordered by it.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Online/offline state of a user, one record per user.
///
/// `is_online == true` implies the owning client has an active foreground
/// session; the record is flipped offline with a `last_seen` stamp on
/// background or teardown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceRecord {
    pub user_id: UserId,
    pub is_online: bool,
    pub last_seen: Option<DateTime<Utc>>,
}
