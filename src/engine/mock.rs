use crate::core::PlaybackRate;
use crate::engine::{
    ClockSource, EffectEngine, EffectParams, EffectSource, EngineError, EngineResult,
    MediaEngine, MediaEvent, MediaListener, MediaSource, Playhead,
};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

/// Call received by one of the mock engines
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Media(MediaCall),
    Effect(EffectCall),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Prepare(MediaSource),
    Start,
    Pause,
    Stop,
    Release,
    SeekTo(Duration),
    SetRate(PlaybackRate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectCall {
    Reset,
    SetDataSource {
        source: EffectSource,
        params: EffectParams,
    },
    Prepare,
    Start,
    Pause,
    Stop,
    Release,
    SeekTo(Duration),
    SetRate(PlaybackRate),
}

/// Ordered record of every call made into a pair of mock engines.
///
/// Both engines write into the same log so cross-engine ordering can be checked.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<EngineCall>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: EngineCall) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    /// Copy of all calls recorded so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Take all recorded calls, leaving the log empty
    pub fn take(&self) -> Vec<EngineCall> {
        self.0
            .lock()
            .map(|mut calls| std::mem::take(&mut *calls))
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.0.lock() {
            calls.clear();
        }
    }

    /// Number of recorded calls equal to `call`
    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

/// Check a configured failure list for `op`
fn check(failures: &[&'static str], op: &'static str) -> EngineResult<()> {
    if failures.contains(&op) {
        return Err(EngineError::Backend(format!("injected {} failure", op)));
    }
    Ok(())
}

/// Mock media engine for testing without a renderer.
///
/// Behaves like a simple renderer: tracks playing state, publishes seeks into
/// its playhead and, like real renderers, resumes playback when the rate is
/// changed unless told otherwise.
pub struct MockMediaEngine {
    log: CallLog,
    playhead: Playhead,
    playing: bool,
    duration: Option<Duration>,
    supports_rate: bool,
    rate_resumes_playback: bool,
    failures: Vec<&'static str>,
    listener: MediaNotifier,
}

impl MockMediaEngine {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            playhead: Playhead::new(),
            playing: false,
            duration: None,
            supports_rate: true,
            rate_resumes_playback: true,
            failures: Vec::new(),
            listener: MediaNotifier::default(),
        }
    }

    /// Handle for raising renderer events after the engine is boxed
    pub fn notifier(&self) -> MediaNotifier {
        self.listener.clone()
    }

    /// Duration the renderer reports once prepared
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Renderer that never learns its duration
    pub fn without_duration(mut self) -> Self {
        self.duration = None;
        self
    }

    /// Simulate a platform without playback-rate control
    pub fn without_rate_support(mut self) -> Self {
        self.supports_rate = false;
        self
    }

    /// Keep the playing state untouched when the rate changes
    pub fn without_rate_resume(mut self) -> Self {
        self.rate_resumes_playback = false;
        self
    }

    /// Make the named operation (`"prepare"`, `"start"`, ...) fail
    pub fn fail_on(mut self, op: &'static str) -> Self {
        self.failures.push(op);
        self
    }
}

impl MediaEngine for MockMediaEngine {
    fn prepare(&mut self, source: &MediaSource) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::Prepare(source.clone())));
        check(&self.failures, "prepare")?;
        self.playing = false;
        self.playhead.publish(Duration::ZERO);
        self.listener.emit(MediaEvent::Prepared {
            duration: self.duration,
        });
        Ok(())
    }

    fn start(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::Start));
        check(&self.failures, "start")?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::Pause));
        check(&self.failures, "pause")?;
        self.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::Stop));
        check(&self.failures, "stop")?;
        self.playing = false;
        self.playhead.publish(Duration::ZERO);
        Ok(())
    }

    fn release(&mut self) {
        self.log.record(EngineCall::Media(MediaCall::Release));
        self.playing = false;
        self.listener.clear();
    }

    fn seek_to(&mut self, position: Duration) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::SeekTo(position)));
        check(&self.failures, "seek")?;
        self.playhead.publish(position);
        Ok(())
    }

    fn current_position(&self) -> Duration {
        self.playhead.get()
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn set_playback_rate(&mut self, rate: PlaybackRate) -> EngineResult<()> {
        self.log.record(EngineCall::Media(MediaCall::SetRate(rate)));
        check(&self.failures, "rate")?;
        if self.rate_resumes_playback {
            self.playing = true;
        }
        Ok(())
    }

    fn supports_playback_rate(&self) -> bool {
        self.supports_rate
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn playhead(&self) -> Playhead {
        self.playhead.clone()
    }

    fn subscribe(&mut self, listener: MediaListener) {
        if let Ok(mut slot) = self.listener.0.lock() {
            *slot = Some(listener);
        }
    }
}

/// Shared slot for the listener a [`MockMediaEngine`] was subscribed with
#[derive(Clone, Default)]
pub struct MediaNotifier(Arc<Mutex<Option<MediaListener>>>);

impl MediaNotifier {
    /// Deliver `event` to the subscribed listener, as the renderer would
    pub fn emit(&self, event: MediaEvent) {
        if let Ok(listener) = self.0.lock() {
            if let Some(listener) = listener.as_ref() {
                listener(event);
            }
        }
    }

    fn clear(&self) {
        if let Ok(mut listener) = self.0.lock() {
            *listener = None;
        }
    }
}

/// Shared view of the clock a [`MockEffectEngine`] was handed
#[derive(Clone, Default)]
pub struct ClockSlot(Arc<Mutex<Option<Weak<dyn ClockSource>>>>);

impl ClockSlot {
    fn set(&self, clock: Weak<dyn ClockSource>) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(clock);
        }
    }

    /// Query the clock the way the effect engine would.
    ///
    /// Returns `None` if no clock was registered or the session owning it is gone.
    pub fn sample(&self) -> Option<(Duration, Option<Duration>)> {
        let clock = self.0.lock().ok()?.as_ref()?.upgrade()?;
        Some((clock.current_position(), clock.duration()))
    }
}

/// Mock effect engine recording every call
pub struct MockEffectEngine {
    log: CallLog,
    clock: ClockSlot,
    failures: Vec<&'static str>,
    released: bool,
}

impl MockEffectEngine {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            clock: ClockSlot::default(),
            failures: Vec::new(),
            released: false,
        }
    }

    /// Make the named operation (`"prepare"`, `"data_source"`, ...) fail
    pub fn fail_on(mut self, op: &'static str) -> Self {
        self.failures.push(op);
        self
    }

    /// Handle for inspecting the registered clock after the engine is boxed
    pub fn clock_slot(&self) -> ClockSlot {
        self.clock.clone()
    }
}

impl EffectEngine for MockEffectEngine {
    fn reset(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::Reset));
        check(&self.failures, "reset")
    }

    fn set_data_source(
        &mut self,
        source: &EffectSource,
        params: EffectParams,
        clock: Weak<dyn ClockSource>,
    ) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::SetDataSource {
            source: source.clone(),
            params,
        }));
        check(&self.failures, "data_source")?;
        self.clock.set(clock);
        Ok(())
    }

    fn prepare(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::Prepare));
        check(&self.failures, "prepare")
    }

    fn start(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::Start));
        check(&self.failures, "start")
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::Pause));
        check(&self.failures, "pause")
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::Stop));
        check(&self.failures, "stop")
    }

    fn release(&mut self) {
        assert!(!self.released, "effect engine released twice");
        self.log.record(EngineCall::Effect(EffectCall::Release));
        self.released = true;
    }

    fn seek_to(&mut self, position: Duration) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::SeekTo(position)));
        check(&self.failures, "seek")
    }

    fn set_rate(&mut self, rate: PlaybackRate) -> EngineResult<()> {
        self.log.record(EngineCall::Effect(EffectCall::SetRate(rate)));
        check(&self.failures, "rate")
    }
}
