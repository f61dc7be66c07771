pub mod controller;
pub mod poll;

pub use controller::{Engines, PlaybackController};
pub use poll::{PollStats, PollTick, ProgressPoller};

use crate::core::PlaybackRate;
use crate::engine::{EffectSource, MediaEvent, MediaSource};
use std::fmt;

/// Transport state of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Playing,
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Idle => f.write_str("idle"),
            TransportState::Playing => f.write_str("playing"),
            TransportState::Paused => f.write_str("paused"),
        }
    }
}

/// Whether both engines accepted the session's sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionHealth {
    Ready,
    /// An engine failed to prepare; playback may be partial until re-prepared
    Degraded,
}

/// Event delivered to the owner thread
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Poll(PollTick),
    /// Media engine notification, stamped with the session it was raised in
    Media { session: u64, event: MediaEvent },
}

/// One prepared (media, effect) pairing
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub media: MediaSource,
    pub effect: EffectSource,
    pub rate: PlaybackRate,
    pub state: TransportState,
    pub health: SessionHealth,
}

impl PlaybackSession {
    pub fn new(media: MediaSource, effect: EffectSource) -> Self {
        Self {
            media,
            effect,
            rate: PlaybackRate::NORMAL,
            state: TransportState::Idle,
            health: SessionHealth::Ready,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }
}
