//! # tandem-store
//!
//! Local storage for the Tandem chat engine, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` with typed CRUD helpers for every domain model,
//! plus an async [`Store`] handle layering change notification and live
//! query subscriptions on top, and room-scoped blob storage for file
//! attachments.

pub mod blobs;
pub mod database;
pub mod live;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod presence;
pub mod rooms;
pub mod users;

mod error;

pub use blobs::{BlobStore, FsBlobStore};
pub use database::Database;
pub use error::StoreError;
pub use live::{Store, StoreEvent, Subscription};
pub use models::*;
