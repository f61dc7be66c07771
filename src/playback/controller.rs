use crate::config::PlayerConfig;
use crate::core::{position_at, progress_percent, PlaybackRate};
use crate::engine::{
    ClockSource, DurationProbe, EffectEngine, EffectParams, EffectSource, EngineKind,
    EngineResult, MediaClock, MediaEngine, MediaEvent, MediaSource,
};
use crate::error::ControllerError;
use crate::playback::{
    ControllerEvent, PlaybackSession, PollStats, PollTick, ProgressPoller, SessionHealth,
    TransportState,
};
use crate::ui::{DisplayState, TransportLabel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

/// The external collaborators a controller drives
pub struct Engines {
    pub media: Box<dyn MediaEngine>,
    pub effect: Box<dyn EffectEngine>,
    /// Metadata lookup backing the effect engine's duration query
    pub probe: Arc<dyn DurationProbe>,
}

/// Keeps the media timeline and the effect timeline in step.
///
/// Every method runs on the owner thread. The progress poll and the media
/// engine's notifications arrive as [`ControllerEvent`]s on the channel given to
/// [`new`](Self::new) and must be fed back through
/// [`handle_event`](Self::handle_event) by the owner.
///
/// Engine failures never escape as panics: they are logged, recorded in the
/// display's diagnostic, and the session is stopped so it can be restarted.
pub struct PlaybackController {
    media: Option<Box<dyn MediaEngine>>,
    effect: Option<Box<dyn EffectEngine>>,
    probe: Arc<dyn DurationProbe>,
    clock: Option<Arc<MediaClock>>,
    session: PlaybackSession,
    /// Bumped on every prepare; stamps media events with the session they belong to
    session_id: Arc<AtomicU64>,
    poller: ProgressPoller,
    display: DisplayState,
    effect_params: EffectParams,
    torn_down: bool,
}

impl PlaybackController {
    /// Build a controller and prepare its first session.
    ///
    /// Must be called from within a tokio runtime. A session that fails to
    /// prepare still yields a controller; the failure shows up as a degraded
    /// session and a diagnostic.
    pub fn new(
        engines: Engines,
        media_source: MediaSource,
        effect_source: EffectSource,
        config: &PlayerConfig,
        events: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Result<Self, ControllerError> {
        let runtime = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        let Engines {
            mut media,
            effect,
            probe,
        } = engines;

        let session_id = Arc::new(AtomicU64::new(0));
        let listener_events = events.clone();
        let listener_session = session_id.clone();
        media.subscribe(Box::new(move |event| {
            let _ = listener_events.send(ControllerEvent::Media {
                session: listener_session.load(Ordering::Acquire),
                event,
            });
        }));

        let mut controller = Self {
            media: Some(media),
            effect: Some(effect),
            probe,
            clock: None,
            session: PlaybackSession::new(media_source, effect_source),
            session_id,
            poller: ProgressPoller::new(config.poll_interval(), runtime, events),
            display: DisplayState::default(),
            effect_params: config.effect_params(),
            torn_down: false,
        };
        let _ = controller.prepare();
        Ok(controller)
    }

    pub fn state(&self) -> TransportState {
        self.session.state
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Clock handed to the effect engine for the current session
    pub fn clock(&self) -> Option<Arc<MediaClock>> {
        self.clock.clone()
    }

    pub fn poll_stats(&self) -> PollStats {
        self.poller.stats()
    }

    pub fn poll_active(&self) -> bool {
        self.poller.is_active()
    }

    /// Generation of the running progress poll, if any
    pub fn poll_generation(&self) -> Option<u64> {
        self.poller.active_generation()
    }

    /// Identity of the prepared session, as stamped on media events
    pub fn session_id(&self) -> u64 {
        self.session_id.load(Ordering::Acquire)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Load a new (media, effect) pair, stopping whatever is playing first.
    pub fn prepare_session(
        &mut self,
        media: MediaSource,
        effect: EffectSource,
    ) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        if self.session.state != TransportState::Idle {
            self.halt();
        }
        self.session.media = media;
        self.session.effect = effect;
        self.prepare()
    }

    /// Start or resume both timelines, media first
    pub fn start(&mut self) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        self.expect_state("start", &[TransportState::Idle, TransportState::Paused])?;

        self.media_step("start", |media| media.start())?;
        self.effect_step("start", |effect| effect.start())?;

        self.session.state = TransportState::Playing;
        self.display.transport_label = TransportLabel::Pause;
        self.poller.arm();
        info!("Playback started ({})", self.session.media);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        self.expect_state("pause", &[TransportState::Playing])?;

        self.media_step("pause", |media| media.pause())?;
        self.effect_step("pause", |effect| effect.pause())?;

        // Cancel before the state flips so no tick sees a paused session
        self.poller.cancel();
        self.session.state = TransportState::Paused;
        self.display.transport_label = TransportLabel::Play;
        info!("Playback paused");
        Ok(())
    }

    /// Stop both timelines and re-arm a fresh session with the same sources.
    ///
    /// Valid from any state. The returned error, if any, comes from re-preparing.
    pub fn stop(&mut self) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        self.halt();
        info!("Playback stopped");
        self.prepare()
    }

    /// Play/pause button
    pub fn toggle(&mut self) -> Result<(), ControllerError> {
        if self.session.is_playing() {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Seek both timelines to `fraction` (0..=1) of the media duration
    pub fn seek_to(&mut self, fraction: f64) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        self.expect_state("seek", &[TransportState::Playing, TransportState::Paused])?;
        if fraction.is_nan() {
            return Err(ControllerError::InvalidSeekFraction);
        }

        let duration = self
            .media
            .as_deref()
            .and_then(|media| media.duration())
            .filter(|duration| !duration.is_zero())
            .ok_or(ControllerError::InvalidDuration)?;
        let position = position_at(duration, fraction.clamp(0.0, 1.0));

        self.media_step("seek", |media| media.seek_to(position))?;
        self.effect_step("seek", |effect| effect.seek_to(position))?;

        self.display
            .set_position(position, progress_percent(position, duration));
        debug!("Seeked to {:?} of {:?}", position, duration);
        Ok(())
    }

    /// Change the playback rate of both timelines.
    ///
    /// The renderer may resume playback while applying the rate; a paused
    /// session is paused again before the effect engine is touched.
    pub fn set_rate(&mut self, rate: PlaybackRate) -> Result<(), ControllerError> {
        self.ensure_alive()?;
        self.expect_state("change rate", &[TransportState::Playing, TransportState::Paused])?;

        let supported = self
            .media
            .as_deref()
            .is_some_and(|media| media.supports_playback_rate());
        if !supported {
            debug!("Playback rate control unavailable, rate left unset");
            return Err(ControllerError::UnsupportedPlatformCapability);
        }

        let was_playing = self.session.is_playing();
        self.media_step("change rate", |media| media.set_playback_rate(rate))?;
        if !was_playing {
            self.media_step("pause", |media| media.pause())?;
        }
        self.effect_step("change rate", |effect| effect.set_rate(rate))?;

        self.session.rate = rate;
        self.display.set_rate(rate);
        info!("Playback rate set to {}", rate.label());
        Ok(())
    }

    /// Apply the rate for a released rate-bar position
    pub fn set_rate_from_bar(&mut self, percent: u8) -> Result<(), ControllerError> {
        self.set_rate(PlaybackRate::from_bar_percent(percent))
    }

    /// Show the rate for a rate-bar position while it is being dragged
    pub fn preview_rate_bar(&mut self, percent: u8) {
        self.display.rate_text = PlaybackRate::from_bar_percent(percent).label();
    }

    pub fn on_media_completed(&mut self) -> Result<(), ControllerError> {
        debug!("Media completed");
        self.stop()
    }

    /// The app went to the background. Renderers drop their position there,
    /// so the session is stopped rather than paused.
    pub fn on_background(&mut self) -> Result<(), ControllerError> {
        self.stop()
    }

    /// Owner-thread dispatch for events marshalled through the channel.
    ///
    /// Media events from an earlier session (queued before a stop or a new
    /// `prepare_session`) are dropped.
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Poll(tick) => {
                self.on_poll_tick(tick);
            }
            ControllerEvent::Media { session, event } => {
                if self.torn_down {
                    return;
                }
                if session != self.session_id() {
                    trace!("Ignoring {:?} from stale session {}", event, session);
                    return;
                }
                self.on_media_event(event);
            }
        }
    }

    fn on_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Prepared { duration } => {
                // Retry the metadata probe now that the source is loaded
                let probed = self.clock.as_ref().and_then(|clock| clock.refresh_duration());
                let duration = duration.or(probed).filter(|d| !d.is_zero());
                if let Some(duration) = duration {
                    self.display.set_duration(duration);
                }
            }
            MediaEvent::Completed => {
                if self.session.state == TransportState::Idle {
                    debug!("Completion while idle, nothing to stop");
                    return;
                }
                if let Err(e) = self.on_media_completed() {
                    warn!("Failed to re-arm session after completion: {}", e);
                }
            }
        }
    }

    /// Publish progress for a poll tick. Returns whether the display changed.
    ///
    /// Stale ticks (cancelled poll, session no longer playing, controller torn
    /// down) and ticks before the duration is known are ignored.
    pub fn on_poll_tick(&mut self, tick: PollTick) -> bool {
        if self.torn_down
            || !self.poller.accepts(tick)
            || self.session.state != TransportState::Playing
        {
            trace!("Ignoring stale poll tick {}", tick.generation);
            return false;
        }

        let Some(media) = self.media.as_deref() else {
            return false;
        };
        if !media.is_playing() {
            return false;
        }

        let position = media.current_position();
        if let Some(clock) = self.clock.as_ref().filter(|clock| !clock.has_cached_duration()) {
            clock.refresh_duration();
        }
        let Some(duration) = media.duration().filter(|d| !d.is_zero()) else {
            trace!("Duration not ready, skipping progress update");
            return false;
        };

        self.display
            .set_position(position, progress_percent(position, duration));
        true
    }

    /// Release everything. Safe from any state; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            warn!("Controller already torn down");
            return;
        }
        self.torn_down = true;
        self.poller.shutdown();

        if let Some(mut effect) = self.effect.take() {
            if let Err(e) = effect.stop() {
                warn!("Effect engine failed to stop during teardown: {}", e);
            }
            effect.release();
        }
        self.clock = None;
        if let Some(mut media) = self.media.take() {
            media.release();
        }

        self.session.state = TransportState::Idle;
        self.display.transport_label = TransportLabel::Play;
        info!("Playback controller torn down");
    }

    fn ensure_alive(&self) -> Result<(), ControllerError> {
        if self.torn_down {
            Err(ControllerError::TornDown)
        } else {
            Ok(())
        }
    }

    fn expect_state(
        &self,
        op: &'static str,
        allowed: &[TransportState],
    ) -> Result<(), ControllerError> {
        if allowed.contains(&self.session.state) {
            Ok(())
        } else {
            warn!("Rejected {} while {}", op, self.session.state);
            Err(ControllerError::InvalidState {
                op,
                state: self.session.state,
            })
        }
    }

    /// Run a media engine call, stopping the session if it fails
    fn media_step(
        &mut self,
        op: &'static str,
        call: impl FnOnce(&mut dyn MediaEngine) -> EngineResult<()>,
    ) -> Result<(), ControllerError> {
        let media = self.media.as_deref_mut().ok_or(ControllerError::TornDown)?;
        debug!("media engine: {}", op);
        call(media).map_err(|source| {
            self.recover(ControllerError::Engine {
                engine: EngineKind::Media,
                op,
                source,
            })
        })
    }

    /// Run an effect engine call. A degraded session keeps going without the
    /// effect; a healthy one is stopped.
    fn effect_step(
        &mut self,
        op: &'static str,
        call: impl FnOnce(&mut dyn EffectEngine) -> EngineResult<()>,
    ) -> Result<(), ControllerError> {
        let effect = self.effect.as_deref_mut().ok_or(ControllerError::TornDown)?;
        debug!("effect engine: {}", op);
        match call(effect) {
            Ok(()) => Ok(()),
            Err(source) if self.session.health == SessionHealth::Degraded => {
                warn!("Degraded effect engine failed to {}: {}", op, source);
                Ok(())
            }
            Err(source) => Err(self.recover(ControllerError::Engine {
                engine: EngineKind::Effect,
                op,
                source,
            })),
        }
    }

    /// Report `err` and bring the session back to a restartable `Idle`
    fn recover(&mut self, err: ControllerError) -> ControllerError {
        error!("{}", err);
        self.halt();
        let _ = self.prepare();
        // Report after re-preparing so the reset does not hide it
        self.display.report(err.to_string());
        err
    }

    /// Cancel the poll and stop both engines, effect engine first so it cannot
    /// query a clock whose renderer is already stopped.
    fn halt(&mut self) {
        self.poller.cancel();
        if let Some(effect) = self.effect.as_deref_mut() {
            if let Err(e) = effect.stop() {
                warn!("Effect engine failed to stop: {}", e);
            }
        }
        if let Some(media) = self.media.as_deref_mut() {
            if let Err(e) = media.stop() {
                warn!("Media engine failed to stop: {}", e);
            }
        }
        self.session.state = TransportState::Idle;
        self.display.transport_label = TransportLabel::Play;
    }

    /// Reset display and session and load the current sources into both engines
    fn prepare(&mut self) -> Result<(), ControllerError> {
        let (Some(media), Some(effect)) = (self.media.as_deref_mut(), self.effect.as_deref_mut())
        else {
            return Err(ControllerError::TornDown);
        };

        // Events queued by the previous session no longer apply
        self.session_id.fetch_add(1, Ordering::AcqRel);
        self.session.state = TransportState::Idle;
        self.session.rate = PlaybackRate::NORMAL;
        self.session.health = SessionHealth::Ready;
        self.display.reset_for(self.session.media.uri());

        // A fresh clock per session; dropping the old one invalidates any
        // reference the effect engine still holds from the last session.
        let clock = Arc::new(MediaClock::new(
            media.playhead(),
            self.session.media.clone(),
            self.probe.clone(),
        ));
        self.clock = Some(clock.clone());
        clock.refresh_duration();

        let mut failure = None;

        if let Err(source) = media.prepare(&self.session.media) {
            error!("Media engine failed to prepare {}: {}", self.session.media, source);
            failure = Some(ControllerError::EnginePrepareFailure {
                engine: EngineKind::Media,
                source,
            });
        }

        let weak_clock: Weak<dyn ClockSource> = Arc::downgrade(&clock) as Weak<dyn ClockSource>;
        if let Err(source) =
            load_effect(effect, &self.session.effect, self.effect_params, weak_clock)
        {
            error!(
                "Effect engine failed to load {}: {}",
                self.session.effect.path().display(),
                source
            );
            if failure.is_none() {
                failure = Some(ControllerError::EnginePrepareFailure {
                    engine: EngineKind::Effect,
                    source,
                });
            }
        }

        if let Some(duration) = clock.duration() {
            self.display.set_duration(duration);
        }

        match failure {
            Some(err) => {
                self.session.health = SessionHealth::Degraded;
                self.display.report(err.to_string());
                Err(err)
            }
            None => {
                debug!("Session prepared for {}", self.session.media);
                Ok(())
            }
        }
    }
}

fn load_effect(
    effect: &mut dyn EffectEngine,
    source: &EffectSource,
    params: EffectParams,
    clock: Weak<dyn ClockSource>,
) -> EngineResult<()> {
    effect.reset()?;
    effect.set_data_source(source, params, clock)?;
    effect.prepare()
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if !self.torn_down {
            self.teardown();
        }
    }
}
