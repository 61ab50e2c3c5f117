//! Room-list preview rendering.
//!
//! The room list shows one line per conversation.  Before the latest
//! message has resolved the list shows a loading placeholder, which is
//! distinct from a conversation that resolved to empty.

use tandem_shared::time::format_message_time;
use tandem_shared::{MediaCategory, UserId};
use tandem_store::{Message, MessageBody};

/// The latest-message cell of one room in the room list.
#[derive(Debug, Clone, Default)]
pub enum LatestMessage {
    /// The subscription has not delivered a snapshot yet.
    #[default]
    Loading,
    /// The room resolved to an empty log.
    Empty,
    Message(Message),
}

impl LatestMessage {
    /// Fold a subscription snapshot into the cell.
    pub fn resolve(snapshot: Option<Message>) -> Self {
        match snapshot {
            Some(message) => Self::Message(message),
            None => Self::Empty,
        }
    }

    /// The preview line under the peer's name.
    pub fn preview_line(&self, current_user: &UserId) -> String {
        match self {
            Self::Loading => "Loading...".to_string(),
            Self::Empty => "No messages yet. Say Hi 👋".to_string(),
            Self::Message(message) => {
                let prefix = if message.user_id == *current_user {
                    "You: ".to_string()
                } else {
                    format!("{}: ", message.sender_name)
                };
                format!("{prefix}{}", body_line(&message.body))
            }
        }
    }

    /// The timestamp column, empty until a message exists.
    pub fn preview_time(&self) -> String {
        match self {
            Self::Message(message) => format_message_time(message.created_at),
            _ => String::new(),
        }
    }
}

fn body_line(body: &MessageBody) -> String {
    match body {
        MessageBody::Text { text } => text.clone(),
        MessageBody::File { .. } => match body.category() {
            Some(MediaCategory::Image) => "Sent an image".to_string(),
            Some(MediaCategory::Video) => "Sent a video".to_string(),
            Some(MediaCategory::Audio) => "Sent an audio message".to_string(),
            Some(MediaCategory::Pdf) => "Sent a PDF file".to_string(),
            _ => "Sent a message".to_string(),
        },
    }
}

/// Timestamp shown inside a conversation bubble.
pub fn bubble_time(created_at: chrono::DateTime<chrono::Utc>) -> String {
    format_message_time(created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tandem_shared::RoomId;
    use uuid::Uuid;

    fn message(from: &str, name: &str, body: MessageBody) -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id: RoomId::from("uid-a-uid-b"),
            user_id: UserId::from(from),
            sender_name: name.to_string(),
            profile_url: String::new(),
            body,
            created_at: Utc::now(),
        }
    }

    fn file(mime: &str) -> MessageBody {
        MessageBody::File {
            file_name: "f".to_string(),
            file_type: mime.to_string(),
            file_size: 1,
            file_url: "file:///f".to_string(),
        }
    }

    #[test]
    fn loading_and_empty_are_distinct() {
        let me = UserId::from("uid-a");
        assert_eq!(LatestMessage::Loading.preview_line(&me), "Loading...");
        assert_eq!(
            LatestMessage::resolve(None).preview_line(&me),
            "No messages yet. Say Hi 👋"
        );
        assert_eq!(LatestMessage::Loading.preview_time(), "");
    }

    #[test]
    fn own_messages_are_prefixed_with_you() {
        let me = UserId::from("uid-a");
        let mine = LatestMessage::resolve(Some(message(
            "uid-a",
            "Alice",
            MessageBody::Text {
                text: "see you soon".to_string(),
            },
        )));
        assert_eq!(mine.preview_line(&me), "You: see you soon");

        let theirs = LatestMessage::resolve(Some(message(
            "uid-b",
            "Bob",
            MessageBody::Text {
                text: "on my way".to_string(),
            },
        )));
        assert_eq!(theirs.preview_line(&me), "Bob: on my way");
    }

    #[test]
    fn attachments_render_by_category() {
        let me = UserId::from("uid-a");
        let cases = [
            ("image/jpeg", "Sent an image"),
            ("image/png", "Sent an image"),
            ("video/mp4", "Sent a video"),
            ("audio/mpeg", "Sent an audio message"),
            ("application/pdf", "Sent a PDF file"),
            ("application/zip", "Sent a message"),
        ];
        for (mime, expected) in cases {
            let cell = LatestMessage::resolve(Some(message("uid-b", "Bob", file(mime))));
            assert_eq!(cell.preview_line(&me), format!("Bob: {expected}"));
        }
    }

    #[test]
    fn message_cells_carry_a_timestamp() {
        let cell = LatestMessage::resolve(Some(message(
            "uid-b",
            "Bob",
            MessageBody::Text {
                text: "hi".to_string(),
            },
        )));
        assert!(!cell.preview_time().is_empty());
    }
}
