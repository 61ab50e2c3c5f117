//! # tandem-session
//!
//! The authenticated-session lifecycle: a pluggable auth provider seam,
//! an explicitly owned [`Session`] object gating the whole application
//! (unknown / signed-out / signed-in), and the lifecycle-driven
//! [`PresenceTracker`] that keeps the signed-in user's online/offline
//! record current.

pub mod auth;
pub mod local;
pub mod presence;
pub mod session;

pub use auth::{AuthProvider, Credential, ProviderError};
pub use local::LocalAuthProvider;
pub use presence::{status_line, AppLifecycle, PresenceTracker};
pub use session::{Session, SessionState};
