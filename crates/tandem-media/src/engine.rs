//! The real-time engine seam.
//!
//! The call session drives a vendor engine (native SDK, WebRTC stack,
//! or an in-process loopback) through this trait and consumes its
//! channel events.  All operations are fallible; a failure during join
//! aborts the call attempt.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

/// Events emitted by an engine while a channel is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A remote participant joined the channel.
    RemoteJoined(u32),
    /// A remote participant left or dropped.
    RemoteLeft(u32),
    /// A non-fatal engine fault, reported for logging.
    Fault(String),
}

/// Vendor-neutral real-time call engine.
#[async_trait]
pub trait RtcEngine: Send + Sync {
    /// One-time engine setup with the application credential.
    async fn initialize(&self, app_id: &str) -> Result<()>;

    /// Join a named channel as the given local uid.
    async fn join_channel(&self, channel: &str, uid: u32) -> Result<()>;

    async fn leave_channel(&self) -> Result<()>;

    async fn enable_video(&self) -> Result<()>;

    async fn disable_video(&self) -> Result<()>;

    /// Begin rendering the local camera preview.
    async fn start_preview(&self) -> Result<()>;

    async fn mute_local_audio(&self, muted: bool) -> Result<()>;

    async fn mute_local_video(&self, muted: bool) -> Result<()>;

    async fn switch_camera(&self) -> Result<()>;

    /// Subscribe to engine events.  Events arrive in emission order.
    fn events(&self) -> mpsc::UnboundedReceiver<EngineEvent>;
}
