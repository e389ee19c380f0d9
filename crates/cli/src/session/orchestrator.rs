//! Session orchestrator - wires both device sides over one in-process hub.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{ChannelProvider, SunshineConfig, SystemClock};
use data_channel::{MemoryHub, MemoryHubConfig};
use sync_engine::{InMemoryWeatherSource, PrimaryService, SyncResponder};
use tokio::time::{interval_at, Instant, Interval};
use tracing::{info, warn};
use watchface::{LogSurface, OwmConditionCatalog, WatchFace, WatchFaceConfig};

use super::SessionStats;

const AMBIENT_TICK: Duration = Duration::from_secs(60);

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Loaded and validated configuration
    pub config: SunshineConfig,

    /// Session length (None = until shutdown)
    pub duration: Option<Duration>,

    /// Ambient toggle period (None = stay interactive)
    pub ambient_every: Option<Duration>,

    /// Report a low-bit ambient display to the watch face
    pub low_bit_ambient: bool,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Runs the primary service and the watch face until the duration elapses
/// or `shutdown` resolves
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub async fn run<F>(self, shutdown: F) -> Result<SessionStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let config = &self.config.config;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let hub = MemoryHub::new(MemoryHubConfig::from(&config.channel));

        // Primary side
        let source = InMemoryWeatherSource::from_config(config);
        info!(
            rows = source.len(),
            location = %config.primary.location,
            "Weather source seeded"
        );
        let primary_offset = config
            .primary
            .utc_offset()
            .context("primary.time_zone_offset_minutes out of range")?;
        let phone = hub.node(config.primary.node.clone());
        let responder = SyncResponder::new(
            phone.clone(),
            source,
            config.primary.location.clone(),
            config.primary.units,
        )
        .with_utc_offset(primary_offset);
        let primary = PrimaryService::spawn(responder, phone.channel());

        // Companion side
        let face_config = WatchFaceConfig::from_companion(&config.companion)
            .context("Invalid companion settings")?;
        let face = WatchFace::spawn(
            hub.node(config.companion.node.clone()).channel(),
            OwmConditionCatalog,
            LogSurface::new(),
            face_config,
            Arc::new(SystemClock),
        );
        if self.config.low_bit_ambient {
            face.set_low_bit_ambient(true);
        }
        face.set_visible(true);

        info!(
            primary = %config.primary.node,
            companion = %config.companion.node,
            duration_secs = ?self.config.duration.map(|d| d.as_secs()),
            "Session running"
        );

        let deadline = async {
            match self.config.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(shutdown);

        let mut toggle = self
            .config
            .ambient_every
            .map(|period| interval_at(Instant::now() + period, period));
        let mut minute = interval_at(Instant::now() + AMBIENT_TICK, AMBIENT_TICK);
        let mut ambient = false;
        let mut ambient_toggles = 0u64;

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    info!("Session duration reached");
                    break;
                }
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping session...");
                    break;
                }
                _ = next_tick(&mut toggle) => {
                    ambient = !ambient;
                    ambient_toggles += 1;
                    face.set_ambient(ambient);
                    info!(ambient, "Ambient mode toggled");
                }
                _ = minute.tick() => {
                    if ambient {
                        face.time_tick();
                    }
                }
            }
        }

        info!("Shutting down session...");
        face.set_visible(false);
        let face_stats = face.shutdown().await;
        let primary_stats = primary.shutdown().await;

        let stats = SessionStats::new(
            start_time.elapsed(),
            primary_stats,
            face_stats,
            ambient_toggles,
        );
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            redraws = stats.face.redraws,
            "Session shutdown complete"
        );

        Ok(stats)
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
