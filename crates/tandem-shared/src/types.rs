use serde::{Deserialize, Serialize};

use crate::constants::ROOM_ID_SEPARATOR;

/// Stable user identifier, assigned by the auth provider at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of the conversation shared by exactly two participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RoomId(pub String);

impl RoomId {
    /// Derive the shared room id for a pair of participants.
    ///
    /// The two ids are sorted lexicographically and joined, so both sides
    /// derive the same id independently, without a negotiation round trip.
    /// This is a pairing key, not a cryptographic construct; degenerate
    /// inputs (empty ids) still yield a deterministic string.
    pub fn for_pair(a: &UserId, b: &UserId) -> Self {
        let mut ids = [a.as_str(), b.as_str()];
        ids.sort_unstable();
        Self(ids.join(ROOM_ID_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Display category of an attachment, derived from its MIME type.
///
/// Anything not explicitly recognised renders as a generic file with a
/// filename fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Other,
}

impl MediaCategory {
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "image/jpeg" | "image/png" => Self::Image,
            "video/mp4" => Self::Video,
            "audio/mpeg" => Self::Audio,
            "application/pdf" => Self::Pdf,
            _ => Self::Other,
        }
    }
}
