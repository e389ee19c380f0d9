//! TickScheduler - interactive-mode redraw timer
//!
//! Wakes are aligned to whole interval boundaries and tagged with a
//! generation. Stopping or restarting bumps the generation, so a wake that
//! was already queued when the timer changed is recognised as stale.
//!
//! The wake task only holds a weak sender; once the owning loop is gone the
//! wake is dropped.

use std::sync::Arc;
use std::time::Duration;

use contracts::Clock;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

/// Delay from `now_ms` until the next multiple of `interval`
pub fn next_tick_delay(now_ms: i64, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis().max(1) as i64;
    Duration::from_millis((interval_ms - now_ms.rem_euclid(interval_ms)) as u64)
}

/// A scheduled wake as delivered to the owning loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    generation: u64,
}

impl Wake {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    Redraw,
    Stale,
}

struct PendingWake {
    generation: u64,
    task: JoinHandle<()>,
}

/// One-shot timer chain feeding wakes into an event loop
pub struct TickScheduler<E> {
    tx: WeakUnboundedSender<E>,
    interval: Duration,
    clock: Arc<dyn Clock>,
    generation: u64,
    pending: Option<PendingWake>,
}

impl<E> TickScheduler<E>
where
    E: From<Wake> + Send + 'static,
{
    pub fn new(tx: WeakUnboundedSender<E>, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tx,
            interval,
            clock,
            generation: 0,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Never more than one
    pub fn pending_wakes(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    /// Cancel any pending wake and schedule the next boundary
    pub fn start(&mut self) {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let delay = next_tick_delay(self.clock.now().timestamp_millis(), self.interval);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(E::from(Wake { generation }));
            }
        });

        trace!(generation, delay_ms = delay.as_millis() as u64, "Tick scheduled");
        self.pending = Some(PendingWake { generation, task });
    }

    /// Cancel the pending wake and invalidate any already dispatched
    pub fn stop(&mut self) {
        self.cancel();
        self.generation += 1;
    }

    pub fn update(&mut self, should_run: bool) {
        self.stop();
        if should_run {
            self.start();
        }
    }

    pub fn on_wake(&mut self, wake: Wake, should_run: bool) -> WakeOutcome {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == wake.generation);
        if !current {
            trace!(generation = wake.generation, latest = self.generation, "Stale wake");
            return WakeOutcome::Stale;
        }

        self.pending = None;
        if should_run {
            self.start();
        }
        WakeOutcome::Redraw
    }

    fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

impl<E> Drop for TickScheduler<E> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::ManualClock;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    fn clock_at_ms(ms: u32) -> Arc<ManualClock> {
        let base = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        Arc::new(ManualClock::new(
            base + chrono::Duration::milliseconds(i64::from(ms)),
        ))
    }

    fn scheduler(
        clock: Arc<ManualClock>,
    ) -> (TickScheduler<Wake>, mpsc::UnboundedSender<Wake>, mpsc::UnboundedReceiver<Wake>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = TickScheduler::new(tx.downgrade(), Duration::from_millis(1000), clock);
        (scheduler, tx, rx)
    }

    #[test]
    fn test_next_tick_delay() {
        let interval = Duration::from_millis(1000);
        assert_eq!(next_tick_delay(1_250, interval), Duration::from_millis(750));
        assert_eq!(next_tick_delay(2_000, interval), Duration::from_millis(1000));
        assert_eq!(next_tick_delay(2_999, interval), Duration::from_millis(1));
        assert_eq!(
            next_tick_delay(130, Duration::from_millis(60_000)),
            Duration::from_millis(59_870)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_on_boundary() {
        let (mut scheduler, _tx, mut rx) = scheduler(clock_at_ms(250));
        let started = Instant::now();
        scheduler.start();
        assert_eq!(scheduler.pending_wakes(), 1);

        let wake = rx.recv().await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(750) && elapsed < Duration::from_millis(760));
        assert_eq!(scheduler.on_wake(wake, false), WakeOutcome::Redraw);
        assert_eq!(scheduler.pending_wakes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_reschedules_while_running() {
        let clock = clock_at_ms(0);
        let (mut scheduler, _tx, mut rx) = scheduler(clock.clone());
        scheduler.start();

        for _ in 0..3 {
            let wake = rx.recv().await.unwrap();
            clock.advance(chrono::Duration::milliseconds(1000));
            assert_eq!(scheduler.on_wake(wake, true), WakeOutcome::Redraw);
            assert_eq!(scheduler.pending_wakes(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_pending_wake() {
        let (mut scheduler, _tx, mut rx) = scheduler(clock_at_ms(500));
        scheduler.start();
        scheduler.start();
        scheduler.update(true);
        assert_eq!(scheduler.pending_wakes(), 1);

        let wake = rx.recv().await.unwrap();
        assert_eq!(scheduler.on_wake(wake, false), WakeOutcome::Redraw);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_wake_is_stale_after_stop() {
        let (mut scheduler, _tx, mut rx) = scheduler(clock_at_ms(900));
        scheduler.start();
        let wake = rx.recv().await.unwrap();

        // Timer changed while the wake was sitting in the queue
        scheduler.stop();
        assert_eq!(scheduler.on_wake(wake, true), WakeOutcome::Stale);
        assert_eq!(scheduler.pending_wakes(), 0);

        scheduler.start();
        assert_eq!(scheduler.on_wake(wake, true), WakeOutcome::Stale);
        assert_eq!(scheduler.pending_wakes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_stops_when_not_running() {
        let (mut scheduler, _tx, mut rx) = scheduler(clock_at_ms(0));
        scheduler.update(true);
        assert!(scheduler.is_running());
        scheduler.update(false);
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_dropped_when_loop_is_gone() {
        let (mut scheduler, tx, mut rx) = scheduler(clock_at_ms(0));
        scheduler.start();
        drop(tx);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_none());
    }
}
