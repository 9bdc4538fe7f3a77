use async_trait::async_trait;
use thiserror::Error;

use crate::EntryStatus;
use crate::model::{ContestId, Entry, EntryId, JudgeScore, PublicVote};

/// Structured failure reported by the data store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The backend could not be reached or did not answer.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new("UNAVAILABLE", message)
    }
}

/// Read access to contest rows.
///
/// Implementations are eventually consistent: a write followed by a read may
/// not observe the write. Callers never retry internally.
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Identifiers of every entry belonging to the contest, regardless of status.
    async fn entry_ids(&self, contest_id: ContestId) -> Result<Vec<EntryId>, StoreError>;

    /// Entries of the contest whose status is in `statuses`.
    async fn entries(
        &self,
        contest_id: ContestId,
        statuses: &[EntryStatus],
    ) -> Result<Vec<Entry>, StoreError>;

    /// Judge scores recorded for any of the given entries.
    async fn judge_scores(&self, entry_ids: &[EntryId]) -> Result<Vec<JudgeScore>, StoreError>;

    /// Public votes recorded for any of the given entries.
    async fn public_votes(&self, entry_ids: &[EntryId]) -> Result<Vec<PublicVote>, StoreError>;
}
