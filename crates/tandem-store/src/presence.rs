//! CRUD operations for [`PresenceRecord`] rows.
//!
//! Writes come from the lifecycle-driven presence tracker; reads back the
//! "Online" / "last seen" badge in conversation headers.

use chrono::{DateTime, Utc};
use rusqlite::params;

use tandem_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::PresenceRecord;

impl Database {
    /// Insert or merge a presence record.
    pub fn upsert_presence(&self, record: &PresenceRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO presence (user_id, is_online, last_seen)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                 is_online = excluded.is_online,
                 last_seen = excluded.last_seen",
            params![
                record.user_id.as_str(),
                record.is_online,
                record.last_seen.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Flip a user online.  `last_seen` is left untouched.
    pub fn set_online(&self, user_id: &UserId) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE presence SET is_online = 1 WHERE user_id = ?1",
            params![user_id.as_str()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Flip a user offline, stamping the transition time.
    pub fn set_offline(&self, user_id: &UserId, last_seen: DateTime<Utc>) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE presence SET is_online = 0, last_seen = ?2 WHERE user_id = ?1",
            params![user_id.as_str(), last_seen.to_rfc3339()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Fetch a user's presence record.
    pub fn get_presence(&self, user_id: &UserId) -> Result<PresenceRecord> {
        self.conn()
            .query_row(
                "SELECT user_id, is_online, last_seen FROM presence WHERE user_id = ?1",
                params![user_id.as_str()],
                row_to_presence,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }
}

/// Map a `rusqlite::Row` to a [`PresenceRecord`].
fn row_to_presence(row: &rusqlite::Row<'_>) -> rusqlite::Result<PresenceRecord> {
    let last_seen_str: Option<String> = row.get(2)?;
    let last_seen = last_seen_str
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
        })
        .transpose()?;

    Ok(PresenceRecord {
        user_id: UserId(row.get(0)?),
        is_online: row.get(1)?,
        last_seen,
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

    #[test]
    fn upsert_then_toggle() {
        let (db, _dir) = open_db();
        let uid = UserId::from("uid-1");

        let started = Utc::now();
        db.upsert_presence(&PresenceRecord {
            user_id: uid.clone(),
            is_online: true,
            last_seen: Some(started),
        })
        .unwrap();

        db.set_offline(&uid, started + Duration::minutes(5)).unwrap();
        let rec = db.get_presence(&uid).unwrap();
        assert!(!rec.is_online);
        assert!(rec.last_seen.unwrap() > started);

        let frozen_last_seen = rec.last_seen;
        db.set_online(&uid).unwrap();
        let rec = db.get_presence(&uid).unwrap();
        assert!(rec.is_online);
        // Going online does not touch last_seen.
        assert_eq!(rec.last_seen, frozen_last_seen);
    }

    #[test]
    fn toggling_a_missing_record_fails() {
        let (db, _dir) = open_db();
        assert!(matches!(
            db.set_online(&UserId::from("uid-missing")),
            Err(StoreError::NotFound)
        ));
    }
}
