//! Simulated engines used by the demo binary.
//!
//! The media side runs a small renderer task that advances its playhead in
//! real time (scaled by the playback rate) and reports completion at the end
//! of the source. The effect side follows whatever clock it was handed and
//! logs how far it has come.

use crate::core::PlaybackRate;
use crate::engine::{
    ClockSource, EffectEngine, EffectParams, EffectSource, EngineError, EngineResult,
    MediaEngine, MediaEvent, MediaListener, MediaSource, Playhead,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

const RENDER_INTERVAL: Duration = Duration::from_millis(10);
const EFFECT_INTERVAL: Duration = Duration::from_millis(250);

struct RendererState {
    playing: AtomicBool,
    rate_bits: AtomicU32,
    playhead: Playhead,
    duration: Duration,
    listener: Mutex<Option<MediaListener>>,
}

impl RendererState {
    fn rate(&self) -> f32 {
        f32::from_bits(self.rate_bits.load(Ordering::Relaxed))
    }

    fn notify(&self, event: MediaEvent) {
        if let Ok(listener) = self.listener.lock() {
            if let Some(listener) = listener.as_ref() {
                listener(event);
            }
        }
    }
}

/// Media engine that pretends to render a source of fixed length
pub struct SimulatedMediaEngine {
    state: Arc<RendererState>,
    renderer: Option<JoinHandle<()>>,
    prepared: bool,
}

impl SimulatedMediaEngine {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(RendererState {
                playing: AtomicBool::new(false),
                rate_bits: AtomicU32::new(1.0f32.to_bits()),
                playhead: Playhead::new(),
                duration,
                listener: Mutex::new(None),
            }),
            renderer: None,
            prepared: false,
        }
    }

    fn ensure_renderer(&mut self) -> EngineResult<()> {
        if self.renderer.is_some() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EngineError::Backend(format!("no runtime for renderer: {}", e)))?;
        let state = self.state.clone();

        self.renderer = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(RENDER_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last = Instant::now();

            loop {
                interval.tick().await;
                let now = Instant::now();
                let elapsed = now - last;
                last = now;

                if !state.playing.load(Ordering::Acquire) {
                    continue;
                }

                let advanced = elapsed.mul_f32(state.rate());
                let position = (state.playhead.get() + advanced).min(state.duration);
                state.playhead.publish(position);

                if position >= state.duration {
                    state.playing.store(false, Ordering::Release);
                    debug!("Renderer reached end of source");
                    state.notify(MediaEvent::Completed);
                }
            }
        }));

        Ok(())
    }

    fn require_prepared(&self) -> EngineResult<()> {
        if self.prepared {
            Ok(())
        } else {
            Err(EngineError::NotPrepared)
        }
    }
}

impl MediaEngine for SimulatedMediaEngine {
    fn prepare(&mut self, source: &MediaSource) -> EngineResult<()> {
        self.ensure_renderer()?;
        self.state.playing.store(false, Ordering::Release);
        self.state.rate_bits.store(1.0f32.to_bits(), Ordering::Relaxed);
        self.state.playhead.publish(Duration::ZERO);
        self.prepared = true;
        info!("Renderer prepared {}", source);
        self.state.notify(MediaEvent::Prepared {
            duration: Some(self.state.duration),
        });
        Ok(())
    }

    fn start(&mut self) -> EngineResult<()> {
        self.require_prepared()?;
        self.state.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.require_prepared()?;
        self.state.playing.store(false, Ordering::Release);
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.state.playing.store(false, Ordering::Release);
        self.state.playhead.publish(Duration::ZERO);
        self.prepared = false;
        Ok(())
    }

    fn release(&mut self) {
        self.state.playing.store(false, Ordering::Release);
        self.prepared = false;
        if let Some(renderer) = self.renderer.take() {
            renderer.abort();
        }
        if let Ok(mut listener) = self.state.listener.lock() {
            *listener = None;
        }
    }

    fn seek_to(&mut self, position: Duration) -> EngineResult<()> {
        self.require_prepared()?;
        self.state.playhead.publish(position.min(self.state.duration));
        Ok(())
    }

    fn current_position(&self) -> Duration {
        self.state.playhead.get()
    }

    fn duration(&self) -> Option<Duration> {
        self.prepared.then_some(self.state.duration)
    }

    fn set_playback_rate(&mut self, rate: PlaybackRate) -> EngineResult<()> {
        self.require_prepared()?;
        self.state.rate_bits.store(rate.value().to_bits(), Ordering::Relaxed);
        // Like most platform renderers, a rate change resumes playback
        self.state.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn supports_playback_rate(&self) -> bool {
        true
    }

    fn is_playing(&self) -> bool {
        self.state.playing.load(Ordering::Acquire)
    }

    fn playhead(&self) -> Playhead {
        self.state.playhead.clone()
    }

    fn subscribe(&mut self, listener: MediaListener) {
        if let Ok(mut slot) = self.state.listener.lock() {
            *slot = Some(listener);
        }
    }
}

impl Drop for SimulatedMediaEngine {
    fn drop(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.abort();
        }
    }
}

/// Effect engine that follows its clock source and logs its progress
#[derive(Default)]
pub struct SimulatedEffectEngine {
    source: Option<EffectSource>,
    params: EffectParams,
    clock: Option<Weak<dyn ClockSource>>,
    prepared: bool,
    rate: Option<PlaybackRate>,
    follower: Option<JoinHandle<()>>,
}

impl SimulatedEffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn halt_follower(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
    }
}

impl EffectEngine for SimulatedEffectEngine {
    fn reset(&mut self) -> EngineResult<()> {
        self.halt_follower();
        self.source = None;
        self.clock = None;
        self.prepared = false;
        self.rate = None;
        Ok(())
    }

    fn set_data_source(
        &mut self,
        source: &EffectSource,
        params: EffectParams,
        clock: Weak<dyn ClockSource>,
    ) -> EngineResult<()> {
        if source.path().as_os_str().is_empty() {
            return Err(EngineError::SourceUnavailable("empty effect path".to_string()));
        }
        self.source = Some(source.clone());
        self.params = params;
        self.clock = Some(clock);
        Ok(())
    }

    fn prepare(&mut self) -> EngineResult<()> {
        if self.source.is_none() {
            return Err(EngineError::NotPrepared);
        }
        self.prepared = true;
        Ok(())
    }

    fn start(&mut self) -> EngineResult<()> {
        if !self.prepared {
            return Err(EngineError::NotPrepared);
        }
        let clock = self.clock.clone().ok_or(EngineError::NotPrepared)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EngineError::Backend(format!("no runtime for effect player: {}", e)))?;
        let intensity = self.params.intensity;

        self.halt_follower();
        self.follower = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(EFFECT_INTERVAL);
            loop {
                interval.tick().await;
                let Some(clock) = clock.upgrade() else {
                    trace!("Clock source gone, effect follower exiting");
                    break;
                };
                let position = clock.current_position();
                match clock.duration() {
                    Some(duration) => debug!(
                        "Effect aligned at {:?} of {:?} (intensity {})",
                        position, duration, intensity
                    ),
                    None => debug!("Effect aligned at {:?}, duration unknown", position),
                }
            }
        }));
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.halt_follower();
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.halt_follower();
        self.prepared = false;
        Ok(())
    }

    fn release(&mut self) {
        self.halt_follower();
        self.clock = None;
        self.source = None;
    }

    fn seek_to(&mut self, position: Duration) -> EngineResult<()> {
        debug!("Effect seek to {:?}", position);
        Ok(())
    }

    fn set_rate(&mut self, rate: PlaybackRate) -> EngineResult<()> {
        self.rate = Some(rate);
        debug!("Effect rate {}", rate.label());
        Ok(())
    }
}

impl Drop for SimulatedEffectEngine {
    fn drop(&mut self) {
        self.halt_follower();
    }
}
