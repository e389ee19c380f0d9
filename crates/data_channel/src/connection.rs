//! ConnectionManager - data channel connection lifecycle
//!
//! ```text
//! Disconnected --open--> Connecting --success--> Connected
//!                         |                          |
//!                         +--failure--> Disconnected <--close--+
//! ```
//!
//! Connect runs on a spawned task. Its outcome comes back as a
//! [`ConnectAttempt`] through the completion callback; the owner queues it on
//! its own event loop and calls [`ConnectionManager::resolve`] there, so every
//! state transition happens on the owner's task.

use std::sync::Arc;

use contracts::{ConnectionState, ContractError, DataChannel};
use tracing::{debug, info, instrument, warn};

/// Result of one connect attempt, tagged with its attempt number
#[derive(Debug)]
pub struct ConnectAttempt {
    pub attempt: u64,
    pub result: Result<(), ContractError>,
}

/// Transition produced by resolving a current attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Failed(String),
}

/// Completion callback, invoked from the connect task
pub type AttemptCallback = Arc<dyn Fn(ConnectAttempt) + Send + Sync>;

/// Owns one channel client and its connection state
pub struct ConnectionManager<C> {
    channel: Arc<C>,
    state: ConnectionState,
    /// Attempt that may still move us out of `Connecting`
    pending_attempt: Option<u64>,
    next_attempt: u64,
    on_attempt: AttemptCallback,
}

impl<C> ConnectionManager<C>
where
    C: DataChannel + Sync + 'static,
{
    pub fn new(channel: Arc<C>, on_attempt: AttemptCallback) -> Self {
        Self {
            channel,
            state: ConnectionState::Disconnected,
            pending_attempt: None,
            next_attempt: 1,
            on_attempt,
        }
    }

    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Start connecting. No-op unless `Disconnected`.
    ///
    /// Returns the attempt number when a new attempt was started.
    /// Must be called within a tokio runtime.
    #[instrument(name = "connection_open", skip(self), fields(node = %self.channel.node()))]
    pub fn open(&mut self) -> Option<u64> {
        if self.state != ConnectionState::Disconnected {
            debug!(state = ?self.state, "Open ignored, connection already in progress");
            return None;
        }

        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.pending_attempt = Some(attempt);
        self.state = ConnectionState::Connecting;

        let channel = Arc::clone(&self.channel);
        let on_attempt = Arc::clone(&self.on_attempt);
        tokio::spawn(async move {
            let result = channel.connect().await;
            on_attempt(ConnectAttempt { attempt, result });
        });

        debug!(attempt, "Connect attempt started");
        Some(attempt)
    }

    /// Apply a finished attempt
    ///
    /// Returns `None` for stale attempts (superseded or closed). A stale
    /// attempt that succeeded after `close()` releases the connection.
    #[instrument(
        name = "connection_resolve",
        skip(self, attempt),
        fields(node = %self.channel.node(), attempt = attempt.attempt)
    )]
    pub fn resolve(&mut self, attempt: ConnectAttempt) -> Option<ConnectionEvent> {
        let current = self.state == ConnectionState::Connecting
            && self.pending_attempt == Some(attempt.attempt);

        if !current {
            if attempt.result.is_ok() && self.state == ConnectionState::Disconnected {
                debug!("Stale attempt connected after close, releasing");
                self.channel.disconnect();
            } else {
                debug!(state = ?self.state, "Stale connect attempt ignored");
            }
            return None;
        }

        self.pending_attempt = None;
        match attempt.result {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                info!("Data channel connected");
                Some(ConnectionEvent::Connected)
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                warn!(error = %e, "Data channel connection failed");
                Some(ConnectionEvent::Failed(e.to_string()))
            }
        }
    }

    /// Drop the connection. No-op when `Disconnected`; abandons a pending attempt.
    #[instrument(name = "connection_close", skip(self), fields(node = %self.channel.node()))]
    pub fn close(&mut self) {
        match self.state {
            ConnectionState::Disconnected => {}
            ConnectionState::Connecting => {
                self.pending_attempt = None;
                self.state = ConnectionState::Disconnected;
                self.channel.disconnect();
                debug!("Pending connect attempt abandoned");
            }
            ConnectionState::Connected => {
                self.state = ConnectionState::Disconnected;
                self.channel.disconnect();
                info!("Data channel disconnected");
            }
        }
    }
}
