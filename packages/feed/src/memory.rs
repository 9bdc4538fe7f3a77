use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::{ChangeEvent, ChannelStatus, SubscriptionSpec};
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::subscription::{ChangeFeed, Subscription, SubscriptionId, Unsubscribe};

struct Subscriber {
    channel: String,
    spec: SubscriptionSpec,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    subscribers: DashMap<SubscriptionId, Subscriber>,
    channels: DashMap<String, watch::Sender<ChannelStatus>>,
}

impl Registry {
    // The channel entry stays locked while subscribers are checked, and
    // `subscribe` inserts its subscriber under the same lock.
    fn drop_channel_if_unused(&self, channel: &str) {
        self.channels.remove_if(channel, |_, _| {
            !self
                .subscribers
                .iter()
                .any(|subscriber| subscriber.channel == channel)
        });
    }
}

impl Unsubscribe for Registry {
    fn unsubscribe(&self, id: SubscriptionId) {
        if let Some((_, subscriber)) = self.subscribers.remove(&id) {
            self.drop_channel_if_unused(&subscriber.channel);
        }
    }
}

/// In-process change feed.
///
/// Writers call [`MemoryFeed::publish`] after committing a row change; every
/// live subscription whose spec matches receives the event, in publish order.
#[derive(Clone, Default)]
pub struct MemoryFeed {
    registry: Arc<Registry>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every matching subscription. Returns the number of deliveries.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();

        for subscriber in self.registry.subscribers.iter() {
            if !subscriber.spec.matches(&event) {
                continue;
            }
            if subscriber.sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                dead.push(*subscriber.key());
            }
        }

        for id in dead {
            debug!(id = %id, "Pruning closed subscription");
            self.registry.unsubscribe(id);
        }

        debug!(
            table = event.table.as_str(),
            kind = ?event.kind,
            delivered,
            "Published change event"
        );
        delivered
    }

    /// Report a transport status transition on a channel.
    pub fn set_status(&self, channel: &str, status: ChannelStatus) {
        match self.registry.channels.get(channel) {
            Some(sender) => {
                if !status.is_live() {
                    warn!(channel, ?status, "Channel status changed");
                }
                sender.send_replace(status);
            }
            None => debug!(channel, "Status for unknown channel ignored"),
        }
    }

    /// Close a channel: report `Closed` and drop its subscriptions' senders.
    pub fn close_channel(&self, channel: &str) {
        self.set_status(channel, ChannelStatus::Closed);
        self.registry
            .subscribers
            .retain(|_, subscriber| subscriber.channel != channel);
        self.registry.drop_channel_if_unused(channel);
        info!(channel, "Channel closed");
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers.len()
    }

    pub fn channel_subscribers(&self, channel: &str) -> usize {
        self.registry
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.channel == channel)
            .count()
    }
}

#[async_trait]
impl ChangeFeed for MemoryFeed {
    async fn subscribe(
        &self,
        channel: &str,
        spec: SubscriptionSpec,
    ) -> Result<Subscription, FeedError> {
        if channel.trim().is_empty() {
            return Err(FeedError::InvalidChannel(channel.to_string()));
        }

        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        debug!(id = %id, channel, table = spec.table.as_str(), "Subscribed");

        let status = {
            let status_sender = self
                .registry
                .channels
                .entry(channel.to_string())
                .or_insert_with(|| watch::channel(ChannelStatus::Subscribed).0);
            self.registry.subscribers.insert(
                id,
                Subscriber {
                    channel: channel.to_string(),
                    spec,
                    sender,
                },
            );
            status_sender.subscribe()
        };

        let release: Arc<dyn Unsubscribe> = self.registry.clone();
        Ok(Subscription::new(id, channel, receiver, status, release))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry.unsubscribe(id);
    }
}
