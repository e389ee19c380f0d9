//! WatchFace - companion event loop
//!
//! Lifecycle hooks, connect completions, weather changes and timer wakes all
//! arrive as [`WatchFaceEvent`]s on one unbounded queue and are handled in
//! order by a single task. Channel callbacks and the tick task only hold weak
//! senders, so dropping the handle (or calling
//! [`WatchFaceHandle::shutdown`]) ends the loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use contracts::{
    ChannelListener, Clock, CompanionConfig, ConditionCatalog, ContractError, DataChannel,
    DataEvent, RequestPolicy, WeatherSnapshot,
};
use data_channel::{AttemptCallback, ConnectAttempt};
use observability::metrics;
use sync_engine::{RequesterStats, SyncRequester};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace};

use crate::directive::{Rgb, Theme};
use crate::scheduler::{TickScheduler, Wake, WakeOutcome};
use crate::state::{Effects, RenderState, RenderStateMachine, SyncAction};
use crate::surface::Surface;

/// Runtime settings for one watch face
#[derive(Debug, Clone)]
pub struct WatchFaceConfig {
    pub policy: RequestPolicy,
    pub tick_interval: Duration,
    pub theme: Theme,
    pub utc_offset: FixedOffset,
}

impl Default for WatchFaceConfig {
    fn default() -> Self {
        Self {
            policy: RequestPolicy::default(),
            tick_interval: Duration::from_millis(1000),
            theme: Theme::default(),
            utc_offset: Utc.fix(),
        }
    }
}

impl WatchFaceConfig {
    pub fn from_companion(config: &CompanionConfig) -> Result<Self, ContractError> {
        let background = Rgb::from_hex(&config.background).ok_or_else(|| {
            ContractError::config_validation("companion.background", "expected #RRGGBB")
        })?;
        let utc_offset = FixedOffset::east_opt(config.time_zone_offset_minutes * 60)
            .ok_or_else(|| {
                ContractError::config_validation(
                    "companion.time_zone_offset_minutes",
                    "offset out of range",
                )
            })?;

        Ok(Self {
            policy: config.request_policy,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            theme: Theme { background },
            utc_offset,
        })
    }
}

/// Inputs to the watch face loop
#[derive(Debug)]
pub enum WatchFaceEvent {
    VisibilityChanged(bool),
    AmbientModeChanged(bool),
    PropertiesChanged { low_bit_ambient: bool },
    TimeZoneChanged(FixedOffset),
    /// Ambient-mode minute tick
    TimeTick,
    DrawRequest,
    Connection(ConnectAttempt),
    DataChanged(DataEvent),
    Wake(Wake),
    Shutdown,
}

impl From<Wake> for WatchFaceEvent {
    fn from(wake: Wake) -> Self {
        WatchFaceEvent::Wake(wake)
    }
}

/// Counters returned on shutdown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchFaceStats {
    pub events: u64,
    pub redraws: u64,
    pub snapshots: u64,
    pub stale_wakes: u64,
    pub requester: RequesterStats,
    pub last_snapshot: Option<WeatherSnapshot>,
}

/// Entry point for spawning a watch face loop
pub struct WatchFace;

impl WatchFace {
    /// Start the loop. The face begins hidden and interactive.
    ///
    /// Must be called within a tokio runtime.
    pub fn spawn<C, K, S>(
        channel: C,
        catalog: K,
        surface: S,
        config: WatchFaceConfig,
        clock: Arc<dyn Clock>,
    ) -> WatchFaceHandle
    where
        C: DataChannel + Sync + 'static,
        K: ConditionCatalog + 'static,
        S: Surface + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let change_tx = tx.downgrade();
        let listener: ChannelListener = Arc::new(move |event: DataEvent| {
            if let Some(tx) = change_tx.upgrade() {
                let _ = tx.send(WatchFaceEvent::DataChanged(event));
            }
        });
        let attempt_tx = tx.downgrade();
        let on_attempt: AttemptCallback = Arc::new(move |attempt: ConnectAttempt| {
            if let Some(tx) = attempt_tx.upgrade() {
                let _ = tx.send(WatchFaceEvent::Connection(attempt));
            }
        });

        let node = channel.node().to_string();
        let requester = SyncRequester::new(Arc::new(channel), listener, on_attempt, config.policy)
            .with_clock(Arc::clone(&clock));
        let scheduler = TickScheduler::new(tx.downgrade(), config.tick_interval, Arc::clone(&clock));
        let machine = RenderStateMachine::new(RenderState::new(config.utc_offset));
        let (state_tx, state_rx) = watch::channel(machine.state().clone());

        let face = FaceLoop {
            machine,
            requester,
            scheduler,
            catalog,
            surface,
            theme: config.theme,
            clock,
            state_tx,
            stats: WatchFaceStats::default(),
        };
        let join = tokio::spawn(face.run(rx));

        info!(node = %node, policy = ?config.policy, "Watch face started");

        WatchFaceHandle {
            tx,
            state: state_rx,
            join,
        }
    }
}

/// Handle to a running watch face
pub struct WatchFaceHandle {
    tx: mpsc::UnboundedSender<WatchFaceEvent>,
    state: watch::Receiver<RenderState>,
    join: JoinHandle<WatchFaceStats>,
}

impl WatchFaceHandle {
    /// Returns false once the loop has stopped
    pub fn send(&self, event: WatchFaceEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn set_visible(&self, visible: bool) -> bool {
        self.send(WatchFaceEvent::VisibilityChanged(visible))
    }

    pub fn set_ambient(&self, ambient: bool) -> bool {
        self.send(WatchFaceEvent::AmbientModeChanged(ambient))
    }

    pub fn set_low_bit_ambient(&self, low_bit_ambient: bool) -> bool {
        self.send(WatchFaceEvent::PropertiesChanged { low_bit_ambient })
    }

    pub fn set_time_zone(&self, utc_offset: FixedOffset) -> bool {
        self.send(WatchFaceEvent::TimeZoneChanged(utc_offset))
    }

    pub fn time_tick(&self) -> bool {
        self.send(WatchFaceEvent::TimeTick)
    }

    pub fn request_draw(&self) -> bool {
        self.send(WatchFaceEvent::DrawRequest)
    }

    /// Render state as of the last handled event
    pub fn state(&self) -> RenderState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every handled event
    pub fn subscribe_state(&self) -> watch::Receiver<RenderState> {
        self.state.clone()
    }

    /// Deactivate sync, stop the timer and join the loop
    #[instrument(name = "watchface_shutdown", skip(self))]
    pub async fn shutdown(self) -> WatchFaceStats {
        let _ = self.tx.send(WatchFaceEvent::Shutdown);
        drop(self.tx);

        match self.join.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = ?e, "Watch face loop panicked");
                WatchFaceStats::default()
            }
        }
    }
}

struct FaceLoop<C, K, S> {
    machine: RenderStateMachine,
    requester: SyncRequester<C>,
    scheduler: TickScheduler<WatchFaceEvent>,
    catalog: K,
    surface: S,
    theme: Theme,
    clock: Arc<dyn Clock>,
    state_tx: watch::Sender<RenderState>,
    stats: WatchFaceStats,
}

impl<C, K, S> FaceLoop<C, K, S>
where
    C: DataChannel + Sync + 'static,
    K: ConditionCatalog,
    S: Surface,
{
    #[instrument(name = "watchface_loop", skip_all)]
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<WatchFaceEvent>) -> WatchFaceStats {
        debug!("Watch face loop started");

        while let Some(event) = rx.recv().await {
            if matches!(event, WatchFaceEvent::Shutdown) {
                break;
            }
            self.stats.events += 1;
            let effects = self.handle(event);
            self.apply(effects);
            self.state_tx.send_replace(self.machine.state().clone());
        }

        self.requester.deactivate();
        self.scheduler.stop();
        self.stats.requester = self.requester.stats().clone();

        debug!(stats = ?self.stats, "Watch face loop stopped");
        self.stats
    }

    fn handle(&mut self, event: WatchFaceEvent) -> Effects {
        trace!(?event, "Handling event");
        match event {
            WatchFaceEvent::VisibilityChanged(visible) => {
                self.machine.set_visibility(visible.into())
            }
            WatchFaceEvent::AmbientModeChanged(ambient) => self.machine.set_ambient(ambient.into()),
            WatchFaceEvent::PropertiesChanged { low_bit_ambient } => {
                self.machine.set_low_bit_ambient(low_bit_ambient)
            }
            WatchFaceEvent::TimeZoneChanged(offset) => self.machine.set_time_zone(offset),
            WatchFaceEvent::TimeTick | WatchFaceEvent::DrawRequest => Effects::redraw(),
            WatchFaceEvent::Connection(attempt) => {
                self.requester.on_connection_attempt(attempt);
                Effects::none()
            }
            WatchFaceEvent::DataChanged(event) => match self.requester.accept(&event) {
                Some(snapshot) => {
                    self.stats.snapshots += 1;
                    self.stats.last_snapshot = Some(snapshot.clone());
                    self.machine.update_snapshot(snapshot)
                }
                None => Effects::none(),
            },
            WatchFaceEvent::Wake(wake) => {
                match self.scheduler.on_wake(wake, self.machine.should_run()) {
                    WakeOutcome::Redraw => Effects::redraw(),
                    WakeOutcome::Stale => {
                        self.stats.stale_wakes += 1;
                        Effects::none()
                    }
                }
            }
            WatchFaceEvent::Shutdown => Effects::none(),
        }
    }

    fn apply(&mut self, effects: Effects) {
        match effects.sync {
            Some(SyncAction::Activate) => self.requester.activate(),
            Some(SyncAction::Deactivate) => self.requester.deactivate(),
            None => {}
        }
        if effects.update_timer {
            self.scheduler.update(self.machine.should_run());
        }
        if effects.redraw {
            self.draw();
        }
    }

    fn draw(&mut self) {
        let directive = self
            .machine
            .directive(self.clock.now(), &self.catalog, &self.theme);
        self.surface.draw(&directive);
        self.stats.redraws += 1;
        metrics::record_redraw(directive.ambient);
    }
}
