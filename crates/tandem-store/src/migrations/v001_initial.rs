//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `rooms`, `messages`, and
//! `presence`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (profile documents)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY NOT NULL,   -- auth-provider id
    name        TEXT NOT NULL,
    email       TEXT NOT NULL,
    profile_url TEXT NOT NULL,
    phone       TEXT,
    location    TEXT,
    occupation  TEXT,
    created_at  TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Rooms (two-party conversations)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS rooms (
    room_id    TEXT PRIMARY KEY NOT NULL,    -- sorted pair of user ids
    created_at TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Messages (append-only per-room log)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id          TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    room_id     TEXT NOT NULL,               -- FK -> rooms(room_id)
    user_id     TEXT NOT NULL,               -- sender
    sender_name TEXT NOT NULL,
    profile_url TEXT NOT NULL,
    text        TEXT,                        -- set for text messages
    file_name   TEXT,                        -- set for file messages
    file_type   TEXT,
    file_size   INTEGER,
    file_url    TEXT,
    created_at  TEXT NOT NULL,               -- store-assigned, ISO-8601

    FOREIGN KEY (room_id) REFERENCES rooms(room_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_room_ts
    ON messages(room_id, created_at);

-- ----------------------------------------------------------------
-- Presence (one record per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS presence (
    user_id   TEXT PRIMARY KEY NOT NULL,
    is_online INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    last_seen TEXT                           -- nullable, ISO-8601
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
