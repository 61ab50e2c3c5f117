//! Append and query operations for the per-room message log.
//!
//! The log is append-only: there is no update or delete path.  Ordering
//! is by the store-assigned `created_at`, with insertion order (rowid)
//! breaking ties between messages written in the same instant.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use tandem_shared::{RoomId, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::models::{Message, MessageBody};

impl Database {
    /// Append a message to its room's log.
    pub fn append_message(&self, message: &Message) -> Result<()> {
        let (text, file_name, file_type, file_size, file_url) = match &message.body {
            MessageBody::Text { text } => (Some(text.as_str()), None, None, None, None),
            MessageBody::File {
                file_name,
                file_type,
                file_size,
                file_url,
            } => (
                None,
                Some(file_name.as_str()),
                Some(file_type.as_str()),
                Some(*file_size),
                Some(file_url.as_str()),
            ),
        };

        self.conn().execute(
            "INSERT INTO messages
                 (id, room_id, user_id, sender_name, profile_url,
                  text, file_name, file_type, file_size, file_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                message.id.to_string(),
                message.room_id.as_str(),
                message.user_id.as_str(),
                message.sender_name,
                message.profile_url,
                text,
                file_name,
                file_type,
                file_size,
                file_url,
                message.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All messages of a room, oldest first (the chat view ordering).
    pub fn messages_for_room(&self, room_id: &RoomId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, room_id, user_id, sender_name, profile_url,
                    text, file_name, file_type, file_size, file_url, created_at
             FROM messages
             WHERE room_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![room_id.as_str()], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// The newest message of a room, if any (the preview ordering).
    pub fn latest_message(&self, room_id: &RoomId) -> Result<Option<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, room_id, user_id, sender_name, profile_url,
                    text, file_name, file_type, file_size, file_url, created_at
             FROM messages
             WHERE room_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )?;

        let mut rows = stmt.query_map(params![room_id.as_str()], row_to_message)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Number of messages in a room.
    pub fn message_count(&self, room_id: &RoomId) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM messages WHERE room_id = ?1",
            params![room_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id_str: String = row.get(0)?;
    let room_id: String = row.get(1)?;
    let user_id: String = row.get(2)?;
    let sender_name: String = row.get(3)?;
    let profile_url: String = row.get(4)?;
    let text: Option<String> = row.get(5)?;
    let file_name: Option<String> = row.get(6)?;
    let file_type: Option<String> = row.get(7)?;
    let file_size: Option<i64> = row.get(8)?;
    let file_url: Option<String> = row.get(9)?;
    let ts_str: String = row.get(10)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let body = match file_type {
        Some(file_type) => MessageBody::File {
            file_name: file_name.unwrap_or_default(),
            file_type,
            file_size: file_size.unwrap_or(0),
            file_url: file_url.unwrap_or_default(),
        },
        None => MessageBody::Text {
            text: text.unwrap_or_default(),
        },
    };

    Ok(Message {
        id,
        room_id: RoomId(room_id),
        user_id: UserId(user_id),
        sender_name,
        profile_url,
        body,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    fn text_message(room: &RoomId, text: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id: room.clone(),
            user_id: UserId::from("uid-alice"),
            sender_name: "Alice".to_string(),
            profile_url: "https://example.com/alice.png".to_string(),
            body: MessageBody::Text {
                text: text.to_string(),
            },
            created_at: at,
        }
    }

    #[test]
    fn append_and_read_back_in_order() {
        let (db, _dir) = open_db();
        let room = RoomId::from("uid-alice-uid-bob");
        db.ensure_room(&room, Utc::now()).unwrap();

        let base = Utc::now();
        db.append_message(&text_message(&room, "first", base)).unwrap();
        db.append_message(&text_message(&room, "second", base + Duration::seconds(1)))
            .unwrap();

        let messages = db.messages_for_room(&room).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].body,
            MessageBody::Text {
                text: "first".to_string()
            }
        );
        assert!(messages[0].created_at <= messages[1].created_at);
    }

    #[test]
    fn latest_message_is_newest() {
        let (db, _dir) = open_db();
        let room = RoomId::from("uid-alice-uid-bob");
        db.ensure_room(&room, Utc::now()).unwrap();

        assert!(db.latest_message(&room).unwrap().is_none());

        let base = Utc::now();
        db.append_message(&text_message(&room, "old", base)).unwrap();
        db.append_message(&text_message(&room, "new", base + Duration::seconds(5)))
            .unwrap();

        let latest = db.latest_message(&room).unwrap().unwrap();
        assert_eq!(
            latest.body,
            MessageBody::Text {
                text: "new".to_string()
            }
        );
        assert_eq!(db.message_count(&room).unwrap(), 2);
    }

    #[test]
    fn same_instant_messages_keep_insertion_order() {
        let (db, _dir) = open_db();
        let room = RoomId::from("uid-alice-uid-bob");
        db.ensure_room(&room, Utc::now()).unwrap();

        let at = Utc::now();
        db.append_message(&text_message(&room, "a", at)).unwrap();
        db.append_message(&text_message(&room, "b", at)).unwrap();

        let messages = db.messages_for_room(&room).unwrap();
        assert_eq!(
            messages[0].body,
            MessageBody::Text {
                text: "a".to_string()
            }
        );
    }

    #[test]
    fn file_message_round_trip() {
        let (db, _dir) = open_db();
        let room = RoomId::from("uid-alice-uid-bob");
        db.ensure_room(&room, Utc::now()).unwrap();

        let mut msg = text_message(&room, "", Utc::now());
        msg.body = MessageBody::File {
            file_name: "cat.png".to_string(),
            file_type: "image/png".to_string(),
            file_size: 2048,
            file_url: "file:///blobs/uid-alice-uid-bob/cat.png".to_string(),
        };
        db.append_message(&msg).unwrap();

        let latest = db.latest_message(&room).unwrap().unwrap();
        assert_eq!(latest.body, msg.body);
        assert_eq!(
            latest.body.category(),
            Some(tandem_shared::MediaCategory::Image)
        );
    }
}
