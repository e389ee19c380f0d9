//! DataChannel trait - transport between primary and companion
//!
//! The transport is external; everything in the workspace talks to it
//! through this trait.

use std::sync::Arc;

use crate::{ContractError, DataEvent, DataItem};

/// Outcome of a publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAck {
    /// Item accepted by the channel
    Delivered,
    /// Channel not connected, item dropped
    Ignored,
}

/// Change listener callback
///
/// Called from the channel's delivery context; implementations should only
/// enqueue.
pub type ChannelListener = Arc<dyn Fn(DataEvent) + Send + Sync>;

/// Opaque subscription id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(pub u64);

impl std::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Data channel client
#[trait_variant::make(DataChannel: Send)]
pub trait LocalDataChannel {
    /// Node this client belongs to (used for logging)
    fn node(&self) -> &str;

    /// Establish the connection
    ///
    /// # Errors
    /// Returns `ChannelConnection` if the channel cannot be reached
    async fn connect(&self) -> Result<(), ContractError>;

    /// Release the connection. No-op when not connected.
    fn disconnect(&self);

    /// Publish an item; `urgent` asks for immediate delivery
    async fn publish(&self, item: DataItem, urgent: bool) -> PublishAck;

    /// Register a change listener
    fn subscribe(&self, listener: ChannelListener) -> SubscriptionHandle;

    /// Remove a listener. Takes effect before returning.
    fn unsubscribe(&self, handle: SubscriptionHandle);

    fn is_connected(&self) -> bool;
}

/// Factory for channel clients
pub trait ChannelProvider: Send + Sync {
    type Channel: DataChannel + Sync + 'static;

    /// Create a fresh, unconnected client
    fn channel(&self) -> Self::Channel;
}
