//! CRUD operations for [`Room`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;

use tandem_shared::RoomId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Room;

impl Database {
    /// Idempotent create-or-merge of a room record.
    ///
    /// Safe (and expected) to call on every room entry: the first call
    /// creates the record with the given creation time, later calls leave
    /// the original `created_at` untouched.  This is the only mechanism
    /// establishing room existence, so callers must not skip it
    /// opportunistically.
    pub fn ensure_room(&self, room_id: &RoomId, created_at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT INTO rooms (room_id, created_at) VALUES (?1, ?2)
             ON CONFLICT(room_id) DO NOTHING",
            params![room_id.as_str(), created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch a single room.
    pub fn get_room(&self, room_id: &RoomId) -> Result<Room> {
        self.conn()
            .query_row(
                "SELECT room_id, created_at FROM rooms WHERE room_id = ?1",
                params![room_id.as_str()],
                row_to_room,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all rooms, newest first.
    pub fn list_rooms(&self) -> Result<Vec<Room>> {
        let mut stmt = self.conn().prepare(
            "SELECT room_id, created_at FROM rooms ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_room)?;

        let mut rooms = Vec::new();
        for row in rows {
            rooms.push(row?);
        }
        Ok(rooms)
    }
}

/// Map a `rusqlite::Row` to a [`Room`].
fn row_to_room(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
    let room_id: String = row.get(0)?;
    let created_str: String = row.get(1)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Room {
        room_id: RoomId(room_id),
        created_at,
    })
}
