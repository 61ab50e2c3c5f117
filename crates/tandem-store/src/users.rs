//! CRUD operations for [`UserProfile`] documents.

use chrono::{DateTime, Utc};
use rusqlite::params;

use tandem_shared::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ProfilePatch, UserProfile};

impl Database {
    /// Insert or fully replace a profile document.
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users
                 (user_id, name, email, profile_url, phone, location, occupation, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                 name        = excluded.name,
                 email       = excluded.email,
                 profile_url = excluded.profile_url,
                 phone       = excluded.phone,
                 location    = excluded.location,
                 occupation  = excluded.occupation",
            params![
                profile.user_id.as_str(),
                profile.name,
                profile.email,
                profile.profile_url,
                profile.phone,
                profile.location,
                profile.occupation,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a profile by user id.
    pub fn get_profile(&self, user_id: &UserId) -> Result<UserProfile> {
        self.conn()
            .query_row(
                "SELECT user_id, name, email, profile_url, phone, location, occupation, created_at
                 FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                row_to_profile,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Merge a partial update into a stored profile.
    ///
    /// `None` fields in the patch leave the corresponding columns
    /// untouched.  Fails with [`StoreError::NotFound`] if no profile
    /// exists for the user.
    pub fn update_profile(&self, user_id: &UserId, patch: &ProfilePatch) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE users SET
                 name        = COALESCE(?2, name),
                 profile_url = COALESCE(?3, profile_url),
                 phone       = COALESCE(?4, phone),
                 location    = COALESCE(?5, location),
                 occupation  = COALESCE(?6, occupation)
             WHERE user_id = ?1",
            params![
                user_id.as_str(),
                patch.name,
                patch.profile_url,
                patch.phone,
                patch.location,
                patch.occupation,
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// List every known profile, ordered by display name.
    ///
    /// Backs the contact list view.
    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, name, email, profile_url, phone, location, occupation, created_at
             FROM users ORDER BY name ASC",
        )?;

        let rows = stmt.query_map([], row_to_profile)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }
}

/// Map a `rusqlite::Row` to a [`UserProfile`].
fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    let created_str: String = row.get(7)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(UserProfile {
        user_id: UserId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        profile_url: row.get(3)?,
        phone: row.get(4)?,
        location: row.get(5)?,
        occupation: row.get(6)?,
        created_at,
    })
}
