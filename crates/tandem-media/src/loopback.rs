//! In-process engine.
//!
//! Stands in for a vendor SDK when running without real devices: every
//! operation succeeds and is recorded, and remote-participant events can
//! be injected by the embedder.  The call session's tests drive their
//! scenarios through it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::engine::{EngineEvent, RtcEngine};
use crate::error::{MediaError, Result};

#[derive(Default)]
struct Shared {
    joined: Option<(String, u32)>,
    subscribers: Vec<mpsc::UnboundedSender<EngineEvent>>,
}

/// [`RtcEngine`] that loops entirely in process.
#[derive(Default)]
pub struct LoopbackEngine {
    shared: Mutex<Shared>,
    initialized: AtomicBool,
    video_enabled: AtomicBool,
    previewing: AtomicBool,
    audio_muted: AtomicBool,
    video_muted: AtomicBool,
    join_calls: AtomicUsize,
    fail_joins: AtomicBool,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a remote-participant event, as a vendor SDK callback would.
    pub fn emit(&self, event: EngineEvent) {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Make subsequent joins fail, to exercise error paths.
    pub fn fail_joins(&self, fail: bool) {
        self.fail_joins.store(fail, Ordering::SeqCst);
    }

    pub fn join_calls(&self) -> usize {
        self.join_calls.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn joined_channel(&self) -> Option<(String, u32)> {
        self.shared
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .joined
            .clone()
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled.load(Ordering::SeqCst)
    }

    pub fn previewing(&self) -> bool {
        self.previewing.load(Ordering::SeqCst)
    }

    pub fn audio_muted(&self) -> bool {
        self.audio_muted.load(Ordering::SeqCst)
    }

    pub fn video_muted(&self) -> bool {
        self.video_muted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RtcEngine for LoopbackEngine {
    async fn initialize(&self, _app_id: &str) -> Result<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn join_channel(&self, channel: &str, uid: u32) -> Result<()> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_joins.load(Ordering::SeqCst) {
            return Err(MediaError::Engine("join rejected".to_string()));
        }
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.joined = Some((channel.to_string(), uid));
        Ok(())
    }

    async fn leave_channel(&self) -> Result<()> {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.joined = None;
        Ok(())
    }

    async fn enable_video(&self) -> Result<()> {
        self.video_enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disable_video(&self) -> Result<()> {
        self.video_enabled.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn start_preview(&self) -> Result<()> {
        self.previewing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn mute_local_audio(&self, muted: bool) -> Result<()> {
        self.audio_muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn mute_local_video(&self, muted: bool) -> Result<()> {
        self.video_muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    async fn switch_camera(&self) -> Result<()> {
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        shared.subscribers.push(tx);
        rx
    }
}
