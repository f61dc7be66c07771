use crate::engine::{EngineError, EngineKind};
use crate::playback::TransportState;

/// Errors surfaced by [`PlaybackController`](crate::playback::PlaybackController).
///
/// None of these leave the controller unusable: by the time one is returned the
/// session is either unchanged or back in `Idle` and ready to be restarted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    /// An engine failed to load or prepare its source; the session is degraded
    #[error("{engine} failed to prepare: {source}")]
    EnginePrepareFailure {
        engine: EngineKind,
        #[source]
        source: EngineError,
    },

    /// An engine failed during a transport operation; the session was stopped
    #[error("{engine} failed to {op}: {source}")]
    Engine {
        engine: EngineKind,
        op: &'static str,
        #[source]
        source: EngineError,
    },

    /// The platform cannot change the playback rate
    #[error("playback rate control is not available on this platform")]
    UnsupportedPlatformCapability,

    /// The renderer does not know the media duration yet
    #[error("media duration is not known yet")]
    InvalidDuration,

    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: TransportState,
    },

    #[error("seek fraction must be a number between 0 and 1")]
    InvalidSeekFraction,

    #[error("no tokio runtime available for the progress poll")]
    NoRuntime,

    #[error("controller has been torn down")]
    TornDown,
}
