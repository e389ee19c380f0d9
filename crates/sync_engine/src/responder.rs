//! SyncResponder - primary side
//!
//! Answers `/update_req` changes with the current weather summary.

use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use contracts::{
    ChannelProvider, Clock, DataChannel, PublishAck, SyncResponse, SystemClock, TemperatureUnits,
    WeatherSnapshot, WeatherSource, UPDATE_REQUEST_PATH, WEATHER_DATA_PATH,
};
use observability::{metrics, Side};
use tracing::{debug, info, instrument, warn};

use crate::codec;
use crate::format::format_temperature;

/// What the responder did with one change signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Path not handled
    Ignored,
    /// No forecast row (or source failure); nothing published
    NoData,
    /// Snapshot published on `/weather_data`
    Published(WeatherSnapshot),
    /// Could not reach the channel
    ConnectionFailed(String),
}

/// Stateless request handler
///
/// Each handled signal opens a fresh channel client, publishes at most one
/// response and disconnects.
pub struct SyncResponder<P, S> {
    provider: P,
    source: S,
    location: String,
    units: TemperatureUnits,
    utc_offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl<P, S> SyncResponder<P, S>
where
    P: ChannelProvider,
    S: WeatherSource,
{
    pub fn new(provider: P, source: S, location: impl Into<String>, units: TemperatureUnits) -> Self {
        Self {
            provider,
            source,
            location: location.into(),
            units,
            utc_offset: Utc.fix(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Local offset of the primary; forecasts start at its calendar day
    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Handle one change notification
    #[instrument(name = "responder_on_signal", skip(self), fields(location = %self.location))]
    pub async fn on_signal(&self, path: &str) -> SignalOutcome {
        if path != UPDATE_REQUEST_PATH {
            debug!(path, "Change on unhandled path ignored");
            metrics::record_signal_ignored(ignored_kind(path));
            return SignalOutcome::Ignored;
        }

        let channel = self.provider.channel();
        if let Err(e) = channel.connect().await {
            warn!(error = %e, "Cannot reach data channel, request dropped");
            metrics::record_connection_failure(Side::Primary);
            return SignalOutcome::ConnectionFailed(e.to_string());
        }

        let outcome = self.respond(&channel).await;
        channel.disconnect();
        outcome
    }

    async fn respond(&self, channel: &P::Channel) -> SignalOutcome {
        let now = self.clock.now();
        let today = now.with_timezone(&self.utc_offset).date_naive();
        let forecast = match self.source.latest_forecast(&self.location, today) {
            Ok(Some(forecast)) => forecast,
            Ok(None) => {
                info!("No forecast available, nothing published");
                metrics::record_no_data(&self.location);
                return SignalOutcome::NoData;
            }
            Err(e) => {
                warn!(error = %e, "Weather source query failed");
                metrics::record_no_data(&self.location);
                return SignalOutcome::NoData;
            }
        };

        let snapshot = WeatherSnapshot::new(
            format_temperature(forecast.high, self.units),
            format_temperature(forecast.low, self.units),
            forecast.condition_code,
            now,
        );
        let item = codec::encode_response(&SyncResponse::from(snapshot.clone()));

        match channel.publish(item, true).await {
            PublishAck::Delivered => {
                info!(
                    high = snapshot.high_temp(),
                    low = snapshot.low_temp(),
                    condition = snapshot.condition_code(),
                    "Weather data published"
                );
                metrics::record_response_published(snapshot.condition_code());
                SignalOutcome::Published(snapshot)
            }
            PublishAck::Ignored => {
                warn!("Channel dropped before publish");
                SignalOutcome::ConnectionFailed("channel disconnected before publish".into())
            }
        }
    }
}

/// Bounded metric label for an unhandled path
fn ignored_kind(path: &str) -> &'static str {
    if path == WEATHER_DATA_PATH {
        "weather_data"
    } else {
        "other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryWeatherSource;
    use chrono::{NaiveDate, TimeZone};
    use contracts::{keys, ContractError, DataValue, Forecast, ManualClock};
    use data_channel::{MemoryHub, MemoryNode};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap(),
        ))
    }

    fn seeded_source() -> InMemoryWeatherSource {
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

    fn responder(
        hub: &MemoryHub,
        source: InMemoryWeatherSource,
    ) -> SyncResponder<MemoryNode, InMemoryWeatherSource> {
        SyncResponder::new(hub.node("phone"), source, "98109", TemperatureUnits::Metric)
            .with_clock(clock())
    }

    #[tokio::test]
    async fn test_update_request_publishes_snapshot() {
        let hub = MemoryHub::default();
        let responder = responder(&hub, seeded_source());

        let outcome = responder.on_signal(UPDATE_REQUEST_PATH).await;
        let snapshot = match outcome {
            SignalOutcome::Published(snapshot) => snapshot,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(snapshot.high_temp(), "75°");
        assert_eq!(snapshot.low_temp(), "58°");
        assert_eq!(snapshot.condition_code(), 800);

        let stored = hub.item(WEATHER_DATA_PATH).unwrap();
        assert_eq!(stored.get(keys::HIGH_TEMP), Some(&DataValue::String("75°".into())));
        assert_eq!(stored.get(keys::WEATHER_CONDITION), Some(&DataValue::Int(800)));
    }

    #[tokio::test]
    async fn test_other_paths_are_ignored() {
        let hub = MemoryHub::default();
        let responder = responder(&hub, seeded_source());

        assert_eq!(responder.on_signal(WEATHER_DATA_PATH).await, SignalOutcome::Ignored);
        assert_eq!(responder.on_signal("/something_else").await, SignalOutcome::Ignored);
        assert_eq!(hub.publish_count(), 0);
    }

    #[test]
    fn test_ignored_kind_is_bounded() {
        assert_eq!(ignored_kind(WEATHER_DATA_PATH), "weather_data");
        assert_eq!(ignored_kind("/something_else"), "other");
        assert_eq!(ignored_kind("/user/42/anything"), "other");
    }

    #[tokio::test]
    async fn test_no_rows_publishes_nothing() {
        let hub = MemoryHub::default();
        let responder = responder(&hub, InMemoryWeatherSource::new());

        assert_eq!(responder.on_signal(UPDATE_REQUEST_PATH).await, SignalOutcome::NoData);
        assert_eq!(hub.publish_count(), 0);
        assert!(hub.item(WEATHER_DATA_PATH).is_none());
    }

    #[tokio::test]
    async fn test_past_rows_are_not_used() {
        let hub = MemoryHub::default();
        let source = InMemoryWeatherSource::new();
        source.insert(
            "98109",
            Forecast {
                date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
                high: 10.0,
                low: 5.0,
                condition_code: 500,
            },
        );
        let responder = responder(&hub, source);
        assert_eq!(responder.on_signal(UPDATE_REQUEST_PATH).await, SignalOutcome::NoData);
    }

    #[tokio::test]
    async fn test_local_evening_uses_local_day() {
        // 20:00 on the 16th at -07:00 is already the 17th in UTC
        let evening: Arc<dyn Clock> = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 17, 3, 0, 0).unwrap(),
        ));
        let hub = MemoryHub::default();
        let responder = SyncResponder::new(
            hub.node("phone"),
            seeded_source(),
            "98109",
            TemperatureUnits::Metric,
        )
        .with_clock(Arc::clone(&evening));

        // UTC day skips the 16th
        assert_eq!(responder.on_signal(UPDATE_REQUEST_PATH).await, SignalOutcome::NoData);

        let responder = responder.with_utc_offset(FixedOffset::west_opt(7 * 3600).unwrap());
        match responder.on_signal(UPDATE_REQUEST_PATH).await {
            SignalOutcome::Published(snapshot) => assert_eq!(snapshot.high_temp(), "75°"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(hub.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_source_error_is_no_data() {
        struct BrokenSource;
        impl WeatherSource for BrokenSource {
            fn latest_forecast(
                &self,
                location: &str,
                _not_before: NaiveDate,
            ) -> Result<Option<Forecast>, ContractError> {
                Err(ContractError::weather_source(location, "store locked"))
            }
        }

        let hub = MemoryHub::default();
        let responder =
            SyncResponder::new(hub.node("phone"), BrokenSource, "98109", TemperatureUnits::Metric);
        assert_eq!(responder.on_signal(UPDATE_REQUEST_PATH).await, SignalOutcome::NoData);
        assert_eq!(hub.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_channel() {
        let hub = MemoryHub::default();
        hub.set_reachable("phone", false);
        let responder = responder(&hub, seeded_source());

        match responder.on_signal(UPDATE_REQUEST_PATH).await {
            SignalOutcome::ConnectionFailed(reason) => assert!(reason.contains("unreachable")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(hub.publish_count(), 0);
    }

    #[tokio::test]
    async fn test_imperial_units() {
        let hub = MemoryHub::default();
        let source = InMemoryWeatherSource::new();
        source.insert(
            "98109",
            Forecast {
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                high: 24.0,
                low: 14.5,
                condition_code: 801,
            },
        );
        let responder = SyncResponder::new(hub.node("phone"), source, "98109", TemperatureUnits::Imperial)
            .with_clock(clock());

        match responder.on_signal(UPDATE_REQUEST_PATH).await {
            SignalOutcome::Published(snapshot) => {
                assert_eq!(snapshot.high_temp(), "75°");
                assert_eq!(snapshot.low_temp(), "58°");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stateless_between_calls() {
        let hub = MemoryHub::default();
        let responder = responder(&hub, seeded_source());

        assert!(matches!(
            responder.on_signal(UPDATE_REQUEST_PATH).await,
            SignalOutcome::Published(_)
        ));
        assert!(matches!(
            responder.on_signal(UPDATE_REQUEST_PATH).await,
            SignalOutcome::Published(_)
        ));
        assert_eq!(hub.publish_count(), 2);
        // Identical payload on the second publish is not a change
        assert_eq!(hub.change_count(), 1);
    }
}
