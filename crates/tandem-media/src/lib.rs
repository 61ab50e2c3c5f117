//! # tandem-media
//!
//! Real-time calling: the vendor-neutral [`RtcEngine`] seam, the
//! in-process [`LoopbackEngine`], and the [`CallSession`] state machine
//! that drives one two-party call at a time.

pub mod call;
pub mod engine;
mod error;
pub mod loopback;

pub use call::{CallKind, CallSession, CallState};
pub use engine::{EngineEvent, RtcEngine};
pub use error::{MediaError, Result};
pub use loopback::LoopbackEngine;
