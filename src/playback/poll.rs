use crate::playback::ControllerEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Tick marshalled from the poll task to the owner thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTick {
    pub generation: u64,
}

/// Arm/cancel counters for the progress poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub armed: u64,
    pub cancelled: u64,
}

struct ActivePoll {
    generation: u64,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Repeating progress-poll timer.
///
/// At most one task is outstanding. Ticks carry the generation they were armed
/// with; cancelling moves the generation on, so any tick still queued for the
/// owner thread is recognisably stale.
pub struct ProgressPoller {
    period: Duration,
    runtime: Handle,
    events: mpsc::UnboundedSender<ControllerEvent>,
    active: Option<ActivePoll>,
    generation: u64,
    stats: PollStats,
    shut_down: bool,
}

impl ProgressPoller {
    pub fn new(
        period: Duration,
        runtime: Handle,
        events: mpsc::UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            period,
            runtime,
            events,
            active: None,
            generation: 0,
            stats: PollStats::default(),
            shut_down: false,
        }
    }

    /// Start ticking. The first tick is sent immediately.
    ///
    /// Returns the generation of the new task, or `None` after shutdown.
    pub fn arm(&mut self) -> Option<u64> {
        if self.shut_down {
            warn!("Progress poll armed after shutdown, ignoring");
            return None;
        }
        if self.active.is_some() {
            warn!("Progress poll armed twice, cancelling the previous task");
            self.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let stop = Arc::new(AtomicBool::new(false));
        let events = self.events.clone();
        let period = self.period;
        let task_stop = stop.clone();

        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if task_stop.load(Ordering::Acquire) {
                    break;
                }
                if events
                    .send(ControllerEvent::Poll(PollTick { generation }))
                    .is_err()
                {
                    break;
                }
            }
        });

        self.active = Some(ActivePoll {
            generation,
            stop,
            task,
        });
        self.stats.armed += 1;
        debug!("Progress poll armed (generation {})", generation);
        Some(generation)
    }

    /// Stop the active task, if any. No tick of the cancelled generation is
    /// accepted once this returns.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop.store(true, Ordering::Release);
            active.task.abort();
            self.stats.cancelled += 1;
            debug!("Progress poll cancelled (generation {})", active.generation);
        }
        // Purge: anything already queued now belongs to an old generation
        self.generation += 1;
    }

    /// Cancel for good; later calls to [`arm`](Self::arm) do nothing
    pub fn shutdown(&mut self) {
        self.cancel();
        self.shut_down = true;
    }

    /// Whether `tick` came from the currently active task
    pub fn accepts(&self, tick: PollTick) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == tick.generation)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Generation of the active task
    pub fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.generation)
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop.store(true, Ordering::Release);
            active.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_poller(period_ms: u64) -> (ProgressPoller, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ProgressPoller::new(Duration::from_millis(period_ms), Handle::current(), tx),
            rx,
        )
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let (mut poller, mut rx) = new_poller(100);
        let generation = poller.arm().unwrap();

        let event = tokio::time::timeout(Duration::from_millis(500), rx.recv())
            .await
            .expect("no tick delivered");
        assert_eq!(event, Some(ControllerEvent::Poll(PollTick { generation })));
        assert!(poller.accepts(PollTick { generation }));
    }

    #[tokio::test]
    async fn test_ticks_repeat() {
        let (mut poller, mut rx) = new_poller(10);
        poller.arm().unwrap();

        for _ in 0..3 {
            let event = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
            assert!(matches!(event, Ok(Some(ControllerEvent::Poll(_)))));
        }
    }

    #[tokio::test]
    async fn test_cancel_makes_queued_ticks_stale() {
        let (mut poller, mut rx) = new_poller(10);
        let generation = poller.arm().unwrap();

        // Let a tick land in the queue, then cancel
        let _ = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        poller.cancel();

        assert!(!poller.is_active());
        assert!(!poller.accepts(PollTick { generation }));
        while let Ok(ControllerEvent::Poll(tick)) = rx.try_recv() {
            assert!(!poller.accepts(tick));
        }

        // Nothing new arrives after cancellation
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rearm_keeps_single_task() {
        let (mut poller, _rx) = new_poller(100);
        let first = poller.arm().unwrap();
        let second = poller.arm().unwrap();

        assert_ne!(first, second);
        assert_eq!(poller.active_generation(), Some(second));
        assert_eq!(poller.stats(), PollStats { armed: 2, cancelled: 1 });
    }

    #[tokio::test]
    async fn test_cancel_without_task_is_not_counted() {
        let (mut poller, _rx) = new_poller(100);
        poller.cancel();
        assert_eq!(poller.stats(), PollStats::default());
    }

    #[tokio::test]
    async fn test_shutdown_refuses_arm() {
        let (mut poller, _rx) = new_poller(100);
        poller.arm().unwrap();
        poller.shutdown();

        assert_eq!(poller.arm(), None);
        assert!(!poller.is_active());
        assert_eq!(poller.stats(), PollStats { armed: 1, cancelled: 1 });
    }
}
