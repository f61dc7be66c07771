use crate::core::PlaybackRate;
use crate::engine::{EngineResult, MediaSource, Playhead};
use std::time::Duration;

/// Notification raised by the media engine
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// The source is ready; `duration` is what the renderer now reports
    Prepared { duration: Option<Duration> },
    /// Playback reached the end of the source
    Completed,
}

/// Callback the media engine invokes for its notifications.
///
/// May be called from an engine-internal thread, so listeners forward the
/// event to the owner thread instead of acting on it directly.
pub type MediaListener = Box<dyn Fn(MediaEvent) + Send + Sync>;

/// Video/audio playback engine driving the primary timeline.
///
/// Calls are expected to be quick hand-offs to the engine's own machinery;
/// none of them may block on I/O.
pub trait MediaEngine: Send {
    /// Load (or reload) `source` and get ready to play from the start
    fn prepare(&mut self, source: &MediaSource) -> EngineResult<()>;

    fn start(&mut self) -> EngineResult<()>;

    fn pause(&mut self) -> EngineResult<()>;

    fn stop(&mut self) -> EngineResult<()>;

    /// Drop every resource held by the renderer
    fn release(&mut self);

    fn seek_to(&mut self, position: Duration) -> EngineResult<()>;

    /// Last position reported by the renderer
    fn current_position(&self) -> Duration;

    /// Duration according to the renderer, `None` until it is ready
    fn duration(&self) -> Option<Duration>;

    /// Apply a playback rate.
    ///
    /// Renderers are allowed to resume playback as a side effect of this call.
    fn set_playback_rate(&mut self, rate: PlaybackRate) -> EngineResult<()>;

    /// Whether the running platform can change the playback rate at all
    fn supports_playback_rate(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// Shared cell the renderer publishes its position into
    fn playhead(&self) -> Playhead;

    /// Register the listener for prepared/completion notifications
    fn subscribe(&mut self, listener: MediaListener);
}
