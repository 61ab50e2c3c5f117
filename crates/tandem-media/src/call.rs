//! Two-party call state machine.
//!
//! A [`CallSession`] owns the local side of one call at a time: Idle,
//! Joining, InCall, Leaving.  Starting a call while one is active is a
//! silent no-op, and every in-call control is a no-op outside `InCall`.
//! The remote side is a single optional participant.

use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{EngineEvent, RtcEngine};
use crate::error::Result;

/// Whether a call was placed with video or audio only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Joining,
    InCall,
    Leaving,
}

/// Local call controller bound to one engine.
pub struct CallSession {
    engine: Arc<dyn RtcEngine>,
    local_uid: u32,
    state: CallState,
    kind: Option<CallKind>,
    muted: bool,
    video_enabled: bool,
    remote_uid: Option<u32>,
}

impl CallSession {
    pub fn new(engine: Arc<dyn RtcEngine>, local_uid: u32) -> Self {
        Self {
            engine,
            local_uid,
            state: CallState::Idle,
            kind: None,
            muted: false,
            video_enabled: false,
            remote_uid: None,
        }
    }

    /// One-time engine setup.  Run before the first call is placed.
    pub async fn init(&self, app_id: &str) -> Result<()> {
        self.engine.initialize(app_id).await
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn kind(&self) -> Option<CallKind> {
        self.kind
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// The single remote participant, once joined.
    pub fn remote_uid(&self) -> Option<u32> {
        self.remote_uid
    }

    /// Join `channel` as a call of the given kind.
    ///
    /// Re-invocation while a call is active or being set up is a silent
    /// no-op; the first call wins.  An engine failure during setup is
    /// logged and returns the session to `Idle` with no retry.
    pub async fn start_call(&mut self, channel: &str, kind: CallKind) -> Result<()> {
        if self.state != CallState::Idle {
            info!(state = ?self.state, "start_call ignored, call already active");
            return Ok(());
        }

        self.state = CallState::Joining;
        if let Err(e) = self.setup(channel, kind).await {
            warn!(channel, error = %e, "call setup failed");
            self.state = CallState::Idle;
            self.kind = None;
            self.video_enabled = false;
            return Err(e);
        }

        self.state = CallState::InCall;
        self.kind = Some(kind);
        info!(channel, ?kind, "call started");
        Ok(())
    }

    async fn setup(&mut self, channel: &str, kind: CallKind) -> Result<()> {
        match kind {
            CallKind::Video => {
                self.engine.enable_video().await?;
                self.engine.start_preview().await?;
                self.video_enabled = true;
            }
            CallKind::Audio => {
                self.engine.disable_video().await?;
                self.video_enabled = false;
            }
        }
        self.engine.join_channel(channel, self.local_uid).await
    }

    /// Leave the active call and reset local controls.
    pub async fn leave_call(&mut self) -> Result<()> {
        if self.state != CallState::InCall {
            return Ok(());
        }

        self.state = CallState::Leaving;
        let result = self.engine.leave_channel().await;

        self.state = CallState::Idle;
        self.kind = None;
        self.muted = false;
        self.video_enabled = false;
        self.remote_uid = None;

        if let Err(e) = &result {
            warn!(error = %e, "engine leave failed, local state reset anyway");
        } else {
            info!("call ended");
        }
        result
    }

    /// Toggle the local microphone.  No-op outside an active call.
    pub async fn toggle_mute(&mut self) -> Result<()> {
        if self.state != CallState::InCall {
            return Ok(());
        }
        let next = !self.muted;
        self.engine.mute_local_audio(next).await?;
        self.muted = next;
        Ok(())
    }

    /// Toggle the local camera.  No-op outside an active call.
    pub async fn toggle_video(&mut self) -> Result<()> {
        if self.state != CallState::InCall {
            return Ok(());
        }
        let next = !self.video_enabled;
        self.engine.mute_local_video(!next).await?;
        self.video_enabled = next;
        Ok(())
    }

    /// Flip between front and back camera.  No-op outside an active call.
    pub async fn switch_camera(&mut self) -> Result<()> {
        if self.state != CallState::InCall {
            return Ok(());
        }
        self.engine.switch_camera().await
    }

    /// Apply an engine event to the session.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::RemoteJoined(uid) => {
                if self.state == CallState::InCall {
                    self.remote_uid = Some(uid);
                    info!(remote = uid, "remote participant joined");
                }
            }
            EngineEvent::RemoteLeft(uid) => {
                if self.remote_uid == Some(uid) {
                    self.remote_uid = None;
                    info!(remote = uid, "remote participant left");
                }
            }
            EngineEvent::Fault(message) => {
                warn!(%message, "engine fault");
            }
        }
    }
}
