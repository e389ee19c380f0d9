//! In-process data channel
//!
//! `MemoryHub` plays the role of the shared data layer between devices: one
//! item per path, last write wins, and every subscriber on every node is told
//! about changes. Publishing a map identical to the stored one is not a
//! change and notifies nobody.
//!
//! Supports failure injection (unreachable nodes) and connect/delivery
//! latency for tests and demo sessions. Non-urgent publishes are stored
//! right away but their notifications wait an extra batching delay.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ChannelConfig, ChannelListener, ChannelProvider, ContractError, DataChannel, DataEvent,
    DataItem, DataMap, PublishAck, SubscriptionHandle,
};
use parking_lot::Mutex;
use tracing::{debug, instrument, trace};

/// MemoryHub behaviour
#[derive(Debug, Clone, Default)]
pub struct MemoryHubConfig {
    /// Delay before connect completes
    pub connect_latency: Duration,
    /// Delay before change notifications are delivered
    pub delivery_latency: Duration,
    /// Added to `delivery_latency` for non-urgent publishes
    pub batch_delay: Duration,
    /// Nodes whose connect attempts fail
    pub unreachable_nodes: Vec<String>,
}

impl From<&ChannelConfig> for MemoryHubConfig {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            connect_latency: Duration::from_millis(config.connect_latency_ms),
            delivery_latency: Duration::from_millis(config.delivery_latency_ms),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            unreachable_nodes: config.unreachable_nodes.clone(),
        }
    }
}

struct Subscriber {
    node: String,
    listener: ChannelListener,
}

struct HubInner {
    connect_latency: Duration,
    delivery_latency: Duration,
    batch_delay: Duration,
    unreachable: Mutex<HashSet<String>>,
    items: Mutex<HashMap<String, DataMap>>,
    subscribers: Mutex<BTreeMap<u64, Subscriber>>,
    next_subscription: AtomicU64,
    publish_count: AtomicU64,
    change_count: AtomicU64,
}

/// Shared in-memory data layer
#[derive(Clone)]
pub struct MemoryHub {
    inner: Arc<HubInner>,
}

impl Default for MemoryHub {
    fn default() -> Self {
        Self::new(MemoryHubConfig::default())
    }
}

impl MemoryHub {
    pub fn new(config: MemoryHubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                connect_latency: config.connect_latency,
                delivery_latency: config.delivery_latency,
                batch_delay: config.batch_delay,
                unreachable: Mutex::new(config.unreachable_nodes.into_iter().collect()),
                items: Mutex::new(HashMap::new()),
                subscribers: Mutex::new(BTreeMap::new()),
                next_subscription: AtomicU64::new(1),
                publish_count: AtomicU64::new(0),
                change_count: AtomicU64::new(0),
            }),
        }
    }

    /// Provider for channel clients on `name`
    pub fn node(&self, name: impl Into<String>) -> MemoryNode {
        MemoryNode {
            hub: self.clone(),
            name: name.into(),
        }
    }

    /// Toggle failure injection for a node
    pub fn set_reachable(&self, node: &str, reachable: bool) {
        let mut unreachable = self.inner.unreachable.lock();
        if reachable {
            unreachable.remove(node);
        } else {
            unreachable.insert(node.to_string());
        }
    }

    pub fn is_reachable(&self, node: &str) -> bool {
        !self.inner.unreachable.lock().contains(node)
    }

    /// Current item stored at `path`
    pub fn item(&self, path: &str) -> Option<DataMap> {
        self.inner.items.lock().get(path).cloned()
    }

    /// Accepted publishes (including duplicates)
    pub fn publish_count(&self) -> u64 {
        self.inner.publish_count.load(Ordering::Relaxed)
    }

    /// Publishes that changed an item
    pub fn change_count(&self) -> u64 {
        self.inner.change_count.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    fn add_subscriber(&self, node: &str, listener: ChannelListener) -> SubscriptionHandle {
        let id = self.inner.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().insert(
            id,
            Subscriber {
                node: node.to_string(),
                listener,
            },
        );
        SubscriptionHandle(id)
    }

    fn remove_subscriber(&self, handle: SubscriptionHandle) -> bool {
        self.inner.subscribers.lock().remove(&handle.0).is_some()
    }

    /// Store the item; returns true if it changed
    fn store(&self, item: &DataItem) -> bool {
        self.inner.publish_count.fetch_add(1, Ordering::Relaxed);
        let mut items = self.inner.items.lock();
        if items.get(&item.path) == Some(&item.map) {
            return false;
        }
        items.insert(item.path.clone(), item.map.clone());
        self.inner.change_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Notify every subscriber of a change
    ///
    /// Listeners are called outside the subscriber lock so they may
    /// subscribe/unsubscribe from inside the callback.
    fn notify(&self, item: DataItem, urgent: bool) {
        let targets: Vec<(u64, ChannelListener)> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(id, sub)| {
                trace!(subscription = id, node = %sub.node, path = %item.path, "Queue change");
                (*id, Arc::clone(&sub.listener))
            })
            .collect();

        let delay = if urgent {
            self.inner.delivery_latency
        } else {
            self.inner.delivery_latency + self.inner.batch_delay
        };
        let hub = self.clone();
        let deliver = move || {
            for (id, listener) in targets {
                // Unsubscribed while the delivery was in flight
                if !hub.inner.subscribers.lock().contains_key(&id) {
                    continue;
                }
                listener(DataEvent {
                    subscription: SubscriptionHandle(id),
                    path: item.path.clone(),
                    map: item.map.clone(),
                });
            }
        };

        if delay.is_zero() {
            deliver();
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                deliver();
            });
        }
    }
}

/// Channel provider bound to one node of a hub
#[derive(Clone)]
pub struct MemoryNode {
    hub: MemoryHub,
    name: String,
}

impl MemoryNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hub(&self) -> &MemoryHub {
        &self.hub
    }
}

impl ChannelProvider for MemoryNode {
    type Channel = MemoryChannel;

    fn channel(&self) -> MemoryChannel {
        MemoryChannel {
            hub: self.hub.clone(),
            node: self.name.clone(),
            connected: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        }
    }
}

/// Channel client on a `MemoryHub`
///
/// Dropping the client removes its subscriptions.
pub struct MemoryChannel {
    hub: MemoryHub,
    node: String,
    connected: AtomicBool,
    subscriptions: Mutex<Vec<SubscriptionHandle>>,
}

impl DataChannel for MemoryChannel {
    fn node(&self) -> &str {
        &self.node
    }

    #[instrument(name = "memory_channel_connect", skip(self), fields(node = %self.node))]
    async fn connect(&self) -> Result<(), ContractError> {
        let latency = self.hub.inner.connect_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if !self.hub.is_reachable(&self.node) {
            return Err(ContractError::channel_connection(
                &self.node,
                "node unreachable",
            ));
        }

        self.connected.store(true, Ordering::SeqCst);
        debug!("Memory channel connected");
        Ok(())
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!(node = %self.node, "Memory channel disconnected");
        }
    }

    #[instrument(
        name = "memory_channel_publish",
        skip(self, item),
        fields(node = %self.node, path = %item.path)
    )]
    async fn publish(&self, item: DataItem, urgent: bool) -> PublishAck {
        if !self.connected.load(Ordering::SeqCst) {
            debug!("Publish ignored, channel not connected");
            return PublishAck::Ignored;
        }

        if self.hub.store(&item) {
            self.hub.notify(item, urgent);
        } else {
            debug!("Identical item already stored, no change notification");
        }
        PublishAck::Delivered
    }

    fn subscribe(&self, listener: ChannelListener) -> SubscriptionHandle {
        let handle = self.hub.add_subscriber(&self.node, listener);
        self.subscriptions.lock().push(handle);
        debug!(node = %self.node, subscription = %handle, "Listener added");
        handle
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscriptions.lock().retain(|h| *h != handle);
        if self.hub.remove_subscriber(handle) {
            debug!(node = %self.node, subscription = %handle, "Listener removed");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        for handle in self.subscriptions.get_mut().drain(..) {
            self.hub.remove_subscriber(handle);
        }
    }
}
