//! # Contracts
//!
//! Frozen interface contracts shared by both device sides: the weather
//! snapshot, channel payloads, lifecycle states, collaborator traits and
//! session configuration.
//! All business crates depend on this crate, reverse dependencies are prohibited.
//!
//! ## Wire Model
//! - Companion publishes on `/update_req` (`curr_time`)
//! - Primary publishes on `/weather_data` (`high_temp`, `low_temp`, `weather_condition`)
//! - No sequence numbers; the last write on a path wins

mod channel;
mod clock;
mod config;
mod error;
mod payload;
mod snapshot;
mod source;
mod state;

pub use channel::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use payload::*;
pub use snapshot::*;
pub use source::*;
pub use state::*;
