//! # Watch Face
//!
//! Companion-side rendering: a pure [`RenderStateMachine`], the interactive
//! [`TickScheduler`], and the [`WatchFace`] event loop that ties them to a
//! [`sync_engine::SyncRequester`].
//!
//! ## Example
//!
//! ```ignore
//! use watchface::{LogSurface, OwmConditionCatalog, WatchFace, WatchFaceConfig};
//!
//! let hub = data_channel::MemoryHub::default();
//! let face = WatchFace::spawn(
//!     hub.node("watch").channel(),
//!     OwmConditionCatalog,
//!     LogSurface::new(),
//!     WatchFaceConfig::default(),
//!     Arc::new(contracts::SystemClock),
//! );
//! face.set_visible(true);
//! // ...
//! let stats = face.shutdown().await;
//! ```

mod conditions;
mod directive;
mod engine;
mod scheduler;
mod state;
mod surface;

pub use conditions::OwmConditionCatalog;
pub use directive::{Background, RenderDirective, Rgb, Theme, Typeface, WeatherLine};
pub use engine::{WatchFace, WatchFaceConfig, WatchFaceEvent, WatchFaceHandle, WatchFaceStats};
pub use scheduler::{next_tick_delay, TickScheduler, Wake, WakeOutcome};
pub use state::{Effects, RenderState, RenderStateMachine, SyncAction};
pub use surface::{LogSurface, RecordingSurface, Surface};
