use crate::engine::MediaSource;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Position/duration queries the effect engine uses to follow the media timeline.
///
/// Both methods may be called from an engine-internal thread at any time. They
/// must return promptly and must never call back into either engine.
pub trait ClockSource: Send + Sync {
    fn current_position(&self) -> Duration;

    /// Total length of the media, `None` if it cannot be determined
    fn duration(&self) -> Option<Duration>;
}

/// Last-known renderer position, shared lock-free between the media engine
/// (writer) and any number of readers.
#[derive(Debug, Clone, Default)]
pub struct Playhead(Arc<AtomicU64>);

impl Playhead {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, position: Duration) {
        self.0.store(position.as_millis() as u64, Ordering::Release);
    }

    pub fn get(&self) -> Duration {
        Duration::from_millis(self.0.load(Ordering::Acquire))
    }
}

/// Looks up a source's duration from its metadata, independent of the renderer
pub trait DurationProbe: Send + Sync {
    fn probe_duration(&self, source: &MediaSource) -> Option<Duration>;
}

impl<F> DurationProbe for F
where
    F: Fn(&MediaSource) -> Option<Duration> + Send + Sync,
{
    fn probe_duration(&self, source: &MediaSource) -> Option<Duration> {
        self(source)
    }
}

const UNKNOWN: u64 = u64::MAX;

/// Clock handed to the effect engine for one prepared session.
///
/// Position comes from the renderer's playhead. Duration comes from source
/// metadata, because the renderer reports nothing useful until it is prepared.
/// Probing happens on the owner thread through
/// [`refresh_duration`](Self::refresh_duration); the first success is cached
/// and the [`ClockSource`] side only ever reads that cache. A new clock is
/// built for every session so the cache is re-validated on reset.
pub struct MediaClock {
    playhead: Playhead,
    source: MediaSource,
    probe: Arc<dyn DurationProbe>,
    cached_ms: AtomicU64,
}

impl MediaClock {
    pub fn new(playhead: Playhead, source: MediaSource, probe: Arc<dyn DurationProbe>) -> Self {
        Self {
            playhead,
            source,
            probe,
            cached_ms: AtomicU64::new(UNKNOWN),
        }
    }

    /// Whether a duration has been extracted and cached yet
    pub fn has_cached_duration(&self) -> bool {
        self.cached_ms.load(Ordering::Acquire) != UNKNOWN
    }

    /// Probe the source's metadata unless a duration is already cached.
    ///
    /// Owner thread only. A failed probe leaves the cache empty so the next
    /// refresh tries again.
    pub fn refresh_duration(&self) -> Option<Duration> {
        if let Some(cached) = self.cached() {
            return Some(cached);
        }

        let duration = self.probe.probe_duration(&self.source)?;
        let millis = (duration.as_millis() as u64).min(UNKNOWN - 1);
        self.cached_ms.store(millis, Ordering::Release);
        Some(Duration::from_millis(millis))
    }

    fn cached(&self) -> Option<Duration> {
        let cached = self.cached_ms.load(Ordering::Acquire);
        (cached != UNKNOWN).then(|| Duration::from_millis(cached))
    }
}

impl ClockSource for MediaClock {
    fn current_position(&self) -> Duration {
        self.playhead.get()
    }

    fn duration(&self) -> Option<Duration> {
        self.cached()
    }
}
