use common::StoreError;
use feed::FeedError;
use thiserror::Error;

/// A read of contest rows failed. The previously cached view stays in place
/// and the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to fetch contest data: {0}")]
    Fetch(#[from] StoreError),
}

/// Starting a watch failed. The watcher reports `retry_required` until the
/// caller watches again.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to open change feed subscription: {0}")]
    Subscribe(#[from] FeedError),

    #[error("Failed to fetch contest membership: {0}")]
    Fetch(#[from] StoreError),
}
