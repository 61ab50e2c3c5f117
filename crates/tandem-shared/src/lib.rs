//! # tandem-shared
//!
//! Identifiers, payload classification, the error taxonomy, and time
//! formatting helpers shared by every tandem crate.

pub mod constants;
pub mod error;
pub mod time;
pub mod types;

pub use error::{AuthError, TandemError};
pub use types::{MediaCategory, RoomId, UserId};
