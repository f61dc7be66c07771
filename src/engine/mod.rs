pub mod clock;
pub mod effect;
pub mod media;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod sim;

pub use clock::{ClockSource, DurationProbe, MediaClock, Playhead};
pub use effect::{EffectEngine, EffectParams};
pub use media::{MediaEngine, MediaEvent, MediaListener};
#[cfg(any(test, feature = "mock"))]
pub use mock::{CallLog, EngineCall, MockEffectEngine, MockMediaEngine};

use std::fmt;
use std::path::PathBuf;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure reported by one of the external playback engines
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("engine is not prepared")]
    NotPrepared,
    #[error("engine has been released")]
    Released,
    #[error("{0}")]
    Backend(String),
}

/// Which of the two engines a call or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Media,
    Effect,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Media => f.write_str("media engine"),
            EngineKind::Effect => f.write_str("effect engine"),
        }
    }
}

/// Identifier of the video/audio source handed to the media engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaSource(String);

impl MediaSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to the haptic effect file loaded by the effect engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectSource(PathBuf);

impl EffectSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}
