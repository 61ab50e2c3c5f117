//! # tandem-client
//!
//! The embedding-facing surface of the workspace: [`ChatClient`] for
//! rooms, messages, and subscriptions, plus the room-list preview
//! rendering the UI layers on top.

pub mod client;
pub mod preview;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::ChatClient;
pub use preview::{bubble_time, LatestMessage};

/// Initialise structured logging for an embedding process.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("tandem_client=debug,tandem_session=debug,tandem_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
