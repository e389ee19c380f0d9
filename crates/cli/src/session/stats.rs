//! Session statistics.

use std::time::Duration;

use contracts::WeatherSnapshot;
use observability::SyncMetricsAggregator;
use sync_engine::ResponderStats;
use watchface::WatchFaceStats;

/// Statistics from a session run
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall time of the session
    pub duration: Duration,

    /// Primary service counters
    pub primary: ResponderStats,

    /// Watch face counters (including its requester)
    pub face: WatchFaceStats,

    /// Ambient mode switches driven by the session
    pub ambient_toggles: u64,

    /// Aggregated view of both sides
    pub sync_metrics: SyncMetricsAggregator,
}

impl SessionStats {
    pub fn new(
        duration: Duration,
        primary: ResponderStats,
        face: WatchFaceStats,
        ambient_toggles: u64,
    ) -> Self {
        let requester = &face.requester;
        let mut sync_metrics = SyncMetricsAggregator {
            requests_published: requester.requests_published,
            responses_published: primary.published,
            snapshots_received: requester.snapshots_accepted,
            no_data: primary.no_data,
            connection_failures: requester.connection_failures + primary.connection_failures,
            redraws: face.redraws,
            ..Default::default()
        };
        if let Some(latency_ms) = requester.last_latency_ms {
            sync_metrics.latency_stats.push(latency_ms as f64);
        }
        if requester.payloads_dropped > 0 {
            sync_metrics
                .dropped
                .insert("malformed".to_string(), requester.payloads_dropped);
        }

        Self {
            duration,
            primary,
            face,
            ambient_toggles,
            sync_metrics,
        }
    }

    /// Snapshot the watch face ended up showing
    pub fn final_snapshot(&self) -> Option<&WeatherSnapshot> {
        self.face.last_snapshot.as_ref()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Session Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Watch face events: {}", self.face.events);
        println!("   ├─ Frames drawn: {}", self.face.redraws);
        println!("   ├─ Stale timer wakes: {}", self.face.stale_wakes);
        println!("   └─ Ambient toggles: {}", self.ambient_toggles);

        println!("\nPrimary");
        println!("   ├─ Change signals: {}", self.primary.signals);
        println!("   ├─ Ignored signals: {}", self.primary.ignored);
        println!("   ├─ Responses published: {}", self.primary.published);
        println!("   └─ No data: {}", self.primary.no_data);

        println!("\nWeather");
        match self.final_snapshot() {
            Some(snapshot) => println!(
                "   └─ {} / {} (condition {})",
                snapshot.high_temp(),
                snapshot.low_temp(),
                snapshot.condition_code()
            ),
            None => println!("   └─ No snapshot received"),
        }

        println!("\n{}", self.sync_metrics.summary());
    }
}
