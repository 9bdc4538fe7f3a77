use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed is closed")]
    Closed,

    #[error("Invalid channel name: {0}")]
    InvalidChannel(String),

    #[error("{0}")]
    Internal(String),
}
