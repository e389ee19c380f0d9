//! # Data Channel
//!
//! Connection lifecycle and the in-process transport.
//!
//! - [`ConnectionManager`]: `Disconnected -> Connecting -> Connected` state
//!   machine over any [`contracts::DataChannel`], with connect completions
//!   delivered as queued [`ConnectAttempt`]s
//! - [`MemoryHub`]: last-write-wins item store shared by all nodes, with
//!   duplicate suppression, latency and failure injection

mod connection;
mod memory;

pub use connection::{AttemptCallback, ConnectAttempt, ConnectionEvent, ConnectionManager};
pub use memory::{MemoryChannel, MemoryHub, MemoryHubConfig, MemoryNode};
