//! SyncRequester - companion side
//!
//! Asks the primary for fresh data once per lifetime (or per activation,
//! depending on [`RequestPolicy`]) and decodes weather payloads.
//!
//! The requester is driven from a single event loop: channel callbacks only
//! enqueue, the owner feeds queued items back through
//! [`SyncRequester::on_connection_attempt`] and [`SyncRequester::accept`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use contracts::{
    ChannelListener, Clock, ConnectionState, ContractError, DataChannel, DataEvent, PublishAck,
    RequestPolicy, SubscriptionHandle, SyncRequest, SystemClock, WeatherSnapshot,
    WEATHER_DATA_PATH,
};
use data_channel::{AttemptCallback, ConnectAttempt, ConnectionEvent, ConnectionManager};
use observability::{metrics, Side};
use tracing::{debug, info, instrument, trace, warn};

use crate::codec;

/// Per-requester counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequesterStats {
    pub activations: u64,
    pub requests_published: u64,
    pub snapshots_accepted: u64,
    pub payloads_dropped: u64,
    pub stale_events: u64,
    pub connection_failures: u64,
    /// Request to response time of the last answered request
    pub last_latency_ms: Option<i64>,
}

/// Companion-side sync driver
pub struct SyncRequester<C> {
    connection: ConnectionManager<C>,
    listener: ChannelListener,
    subscription: Option<SubscriptionHandle>,
    policy: RequestPolicy,
    requested: bool,
    active: bool,
    /// Set when a request goes out, consumed by the first response
    pending_since: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
    stats: RequesterStats,
}

impl<C> SyncRequester<C>
where
    C: DataChannel + Sync + 'static,
{
    /// `listener` receives weather changes; `on_attempt` receives connect
    /// completions. Both should enqueue onto the owner's event loop.
    pub fn new(
        channel: Arc<C>,
        listener: ChannelListener,
        on_attempt: AttemptCallback,
        policy: RequestPolicy,
    ) -> Self {
        Self {
            connection: ConnectionManager::new(channel, on_attempt),
            listener,
            subscription: None,
            policy,
            requested: false,
            active: false,
            pending_since: None,
            clock: Arc::new(SystemClock),
            stats: RequesterStats::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a request has been sent under the current policy
    pub fn has_requested(&self) -> bool {
        self.requested
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription
    }

    pub fn stats(&self) -> &RequesterStats {
        &self.stats
    }

    /// Subscribe, then open the connection. Idempotent while active.
    #[instrument(name = "requester_activate", skip(self), fields(node = %self.connection.channel().node()))]
    pub fn activate(&mut self) {
        if self.active {
            debug!("Already active");
            return;
        }
        self.active = true;
        self.stats.activations += 1;

        // Listen before connecting so a fast response is not missed
        let handle = self
            .connection
            .channel()
            .subscribe(Arc::clone(&self.listener));
        self.subscription = Some(handle);
        self.connection.open();

        debug!(subscription = %handle, "Requester activated");
    }

    /// Unsubscribe and close. Safe when never connected.
    #[instrument(name = "requester_deactivate", skip(self), fields(node = %self.connection.channel().node()))]
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(handle) = self.subscription.take() {
            self.connection.channel().unsubscribe(handle);
        }
        self.connection.close();

        if self.policy == RequestPolicy::OncePerActivation {
            self.requested = false;
        }
        debug!("Requester deactivated");
    }

    /// Resolve a queued connect completion and react to it
    pub fn on_connection_attempt(&mut self, attempt: ConnectAttempt) -> Option<ConnectionEvent> {
        let event = self.connection.resolve(attempt)?;
        match &event {
            ConnectionEvent::Connected => {
                self.on_connected();
            }
            ConnectionEvent::Failed(reason) => self.on_connection_failed(reason),
        }
        Some(event)
    }

    /// Publish the one sync request if none has been sent yet
    ///
    /// Returns whether a request was published. The publish itself is
    /// fire-and-forget; its ack is only logged.
    #[instrument(name = "requester_on_connected", skip(self))]
    pub fn on_connected(&mut self) -> bool {
        if self.requested {
            debug!("Request already sent, not asking again");
            return false;
        }

        let now = self.clock.now();
        let item = codec::encode_request(&SyncRequest::new(now));
        let channel = Arc::clone(self.connection.channel());
        tokio::spawn(async move {
            let ack = channel.publish(item, true).await;
            debug!(?ack, "Update request ack");
            metrics::record_request_published(ack == PublishAck::Delivered);
        });

        self.requested = true;
        self.pending_since = Some(now);
        self.stats.requests_published += 1;
        info!("Update request published");
        true
    }

    pub fn on_connection_failed(&mut self, reason: &str) {
        warn!(reason, "Companion could not connect, no update requested");
        self.stats.connection_failures += 1;
        metrics::record_connection_failure(Side::Companion);
    }

    /// Decode a weather change
    ///
    /// Returns `None` for other paths, for events delivered through a
    /// subscription other than the current one, and for malformed payloads.
    pub fn accept(&mut self, event: &DataEvent) -> Option<WeatherSnapshot> {
        if !event.is_path(WEATHER_DATA_PATH) {
            trace!(path = %event.path, "Change on other path ignored");
            return None;
        }

        if self.subscription != Some(event.subscription) {
            debug!(subscription = %event.subscription, "Late change from a previous subscription dropped");
            self.stats.stale_events += 1;
            return None;
        }

        let now = self.clock.now();
        match codec::decode_response(&event.map, now) {
            Ok(response) => {
                let latency_ms = self
                    .pending_since
                    .take()
                    .map(|sent| (now - sent).num_milliseconds());
                metrics::record_response_received(latency_ms.map(|ms| ms as f64));
                self.stats.snapshots_accepted += 1;
                if latency_ms.is_some() {
                    self.stats.last_latency_ms = latency_ms;
                }
                debug!(
                    high = response.snapshot.high_temp(),
                    low = response.snapshot.low_temp(),
                    condition = response.snapshot.condition_code(),
                    "Weather snapshot received"
                );
                Some(response.snapshot)
            }
            Err(e) => {
                let field = match &e {
                    ContractError::MalformedPayload { field, .. } => field.as_str(),
                    _ => "unknown",
                };
                warn!(error = %e, "Malformed weather payload dropped");
                metrics::record_payload_dropped(field);
                self.stats.payloads_dropped += 1;
                None
            }
        }
    }

    /// Time the outstanding request was sent, if no response arrived yet
    pub fn pending_since(&self) -> Option<DateTime<Utc>> {
        self.pending_since
    }
}
