//! PrimaryService - primary-side listener service
//!
//! Subscribes on a listener channel and serialises change notifications onto
//! one worker task, which hands each to the [`SyncResponder`].

use std::sync::Arc;

use contracts::{
    ChannelProvider, DataChannel, DataEvent, SubscriptionHandle, WeatherSnapshot, WeatherSource,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::responder::{SignalOutcome, SyncResponder};

/// Outcome counters for a running service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderStats {
    pub signals: u64,
    pub ignored: u64,
    pub published: u64,
    pub no_data: u64,
    pub connection_failures: u64,
    pub last_published: Option<WeatherSnapshot>,
}

impl ResponderStats {
    fn record(&mut self, outcome: &SignalOutcome) {
        self.signals += 1;
        match outcome {
            SignalOutcome::Ignored => self.ignored += 1,
            SignalOutcome::NoData => self.no_data += 1,
            SignalOutcome::Published(snapshot) => {
                self.published += 1;
                self.last_published = Some(snapshot.clone());
            }
            SignalOutcome::ConnectionFailed(_) => self.connection_failures += 1,
        }
    }
}

/// Entry point for spawning the primary-side service
pub struct PrimaryService;

impl PrimaryService {
    /// Subscribe on `listener` and start the worker task
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<P, S, L>(responder: SyncResponder<P, S>, listener: L) -> PrimaryHandle<L>
    where
        P: ChannelProvider + 'static,
        S: WeatherSource + 'static,
        L: DataChannel + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<DataEvent>();
        let weak_tx = tx.downgrade();

        let listener = Arc::new(listener);
        let subscription = listener.subscribe(Arc::new(move |event: DataEvent| {
            // Service already shut down
            if let Some(tx) = weak_tx.upgrade() {
                let _ = tx.send(event);
            }
        }));

        let stats = Arc::new(Mutex::new(ResponderStats::default()));
        let worker_stats = Arc::clone(&stats);
        let worker = tokio::spawn(async move {
            service_worker(responder, rx, worker_stats).await;
        });

        info!(node = %listener.node(), subscription = %subscription, "Primary service started");

        PrimaryHandle {
            listener,
            subscription,
            tx,
            stats,
            worker,
        }
    }
}

/// Handle to a running primary service
pub struct PrimaryHandle<L> {
    listener: Arc<L>,
    subscription: SubscriptionHandle,
    tx: mpsc::UnboundedSender<DataEvent>,
    stats: Arc<Mutex<ResponderStats>>,
    worker: JoinHandle<()>,
}

impl<L> PrimaryHandle<L>
where
    L: DataChannel + Sync + 'static,
{
    /// Current counters
    pub fn stats(&self) -> ResponderStats {
        self.stats.lock().clone()
    }

    /// Stop listening, drain queued events and join the worker
    #[instrument(name = "primary_service_shutdown", skip(self))]
    pub async fn shutdown(self) -> ResponderStats {
        self.listener.unsubscribe(self.subscription);
        drop(self.tx);

        if let Err(e) = self.worker.await {
            error!(error = ?e, "Primary service worker panicked");
        }

        let stats = self.stats.lock().clone();
        debug!(?stats, "Primary service stopped");
        stats
    }
}

#[instrument(name = "primary_service_loop", skip_all, fields(location = %responder.location()))]
async fn service_worker<P, S>(
    responder: SyncResponder<P, S>,
    mut rx: mpsc::UnboundedReceiver<DataEvent>,
    stats: Arc<Mutex<ResponderStats>>,
) where
    P: ChannelProvider,
    S: WeatherSource,
{
    debug!("Primary service worker started");

    while let Some(event) = rx.recv().await {
        let outcome = responder.on_signal(&event.path).await;
        stats.lock().record(&outcome);
    }

    debug!("Primary service worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::InMemoryWeatherSource;
    use chrono::{NaiveDate, TimeZone, Utc};
    use contracts::{
        Clock, Forecast, ManualClock, SyncRequest, TemperatureUnits, WEATHER_DATA_PATH,
    };
    use data_channel::MemoryHub;
    use std::time::Duration;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        ))
    }

    fn source() -> InMemoryWeatherSource {
        let source = InMemoryWeatherSource::new();
        source.insert(
            "98109",
            Forecast {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                high: 75.0,
                low: 58.0,
                condition_code: 800,
            },
        );
        source
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_request_from_companion_is_answered() {
        let hub = MemoryHub::default();
        let phone = hub.node("phone");
        let responder = SyncResponder::new(phone.clone(), source(), "98109", TemperatureUnits::Metric)
            .with_clock(clock());
        let handle = PrimaryService::spawn(responder, phone.channel());

        let watch = hub.node("watch").channel();
        watch.connect().await.unwrap();
        let request = codec::encode_request(&SyncRequest::new(Utc::now()));
        watch.publish(request, true).await;

        wait_for(|| hub.item(WEATHER_DATA_PATH).is_some()).await;

        let stats = handle.shutdown().await;
        assert_eq!(stats.published, 1);
        assert_eq!(
            stats.last_published.as_ref().map(|s| s.high_temp().to_string()),
            Some("75°".to_string())
        );
        // The weather publish itself is seen as an ignored change
        assert!(stats.signals >= 1);
    }

    #[tokio::test]
    async fn test_shutdown_unsubscribes() {
        let hub = MemoryHub::default();
        let phone = hub.node("phone");
        let responder = SyncResponder::new(phone.clone(), source(), "98109", TemperatureUnits::Metric);
        let handle = PrimaryService::spawn(responder, phone.channel());
        assert_eq!(hub.subscriber_count(), 1);

        let stats = handle.shutdown().await;
        assert_eq!(stats, ResponderStats::default());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ResponderStats::default();
        stats.record(&SignalOutcome::Ignored);
        stats.record(&SignalOutcome::NoData);
        stats.record(&SignalOutcome::ConnectionFailed("down".into()));
        assert_eq!(stats.signals, 3);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.no_data, 1);
        assert_eq!(stats.connection_failures, 1);
        assert!(stats.last_published.is_none());
    }
}
