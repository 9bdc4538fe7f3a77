pub mod error;
pub mod memory;
pub mod subscription;

pub use error::FeedError;
pub use memory::MemoryFeed;
pub use subscription::{ChangeFeed, Subscription, SubscriptionId};
