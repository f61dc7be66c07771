use crate::core::PlaybackRate;
use crate::engine::{ClockSource, EffectSource, EngineResult};
use std::sync::Weak;
use std::time::Duration;

/// Playback parameters passed along with the effect file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectParams {
    /// Output strength, 255 plays the file as authored
    pub intensity: u8,
    /// Actuator channel
    pub channel: u8,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            intensity: 255,
            channel: 0,
        }
    }
}

/// Haptic effect engine driving the secondary timeline.
///
/// The engine aligns itself to the media timeline by pulling from the
/// [`ClockSource`] it receives in [`set_data_source`](Self::set_data_source);
/// the reference is non-owning and may stop upgrading once the session ends.
/// Construction (the engine's `create`) is left to implementors.
pub trait EffectEngine: Send {
    fn reset(&mut self) -> EngineResult<()>;

    fn set_data_source(
        &mut self,
        source: &EffectSource,
        params: EffectParams,
        clock: Weak<dyn ClockSource>,
    ) -> EngineResult<()>;

    fn prepare(&mut self) -> EngineResult<()>;

    fn start(&mut self) -> EngineResult<()>;

    fn pause(&mut self) -> EngineResult<()>;

    fn stop(&mut self) -> EngineResult<()>;

    /// Free the engine. Calling this twice is a contract violation.
    fn release(&mut self);

    fn seek_to(&mut self, position: Duration) -> EngineResult<()>;

    fn set_rate(&mut self, rate: PlaybackRate) -> EngineResult<()>;
}
