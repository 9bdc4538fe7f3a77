use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ChangeEvent, ChannelStatus, SubscriptionSpec};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Source of table change events.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription on `channel` for the rows described by `spec`.
    async fn subscribe(
        &self,
        channel: &str,
        spec: SubscriptionSpec,
    ) -> Result<Subscription, FeedError>;

    /// Stop delivering to the subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Implemented by transports so a [`Subscription`] can release itself.
pub trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: SubscriptionId);
}

/// A live subscription. Dropping the handle unsubscribes.
pub struct Subscription {
    id: SubscriptionId,
    channel: String,
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    status: watch::Receiver<ChannelStatus>,
    release: Option<Arc<dyn Unsubscribe>>,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        channel: impl Into<String>,
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        status: watch::Receiver<ChannelStatus>,
        release: Arc<dyn Unsubscribe>,
    ) -> Self {
        Self {
            id,
            channel: channel.into(),
            events,
            status,
            release: Some(release),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next event in emission order, or `None` once the transport dropped the subscription.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Latest status reported for the channel.
    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    /// A receiver of channel status transitions, independent of the event stream.
    pub fn status_watch(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(id = %self.id, channel = %self.channel, "Unsubscribing");
            release.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("status", &*self.status.borrow())
            .finish()
    }
}
