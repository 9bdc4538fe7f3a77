use async_trait::async_trait;
use common::{
    ContestId, ContestStore, Entry, EntryId, EntryStatus, JudgeScore, PublicVote, StoreError,
};
use sea_orm::*;

use crate::entity::{entry, judge_score, public_vote};

/// [`ContestStore`] backed by the application database.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn store_error(err: DbErr) -> StoreError {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => StoreError::unavailable(err.to_string()),
        other => StoreError::new("QUERY_FAILED", other.to_string()),
    }
}

#[async_trait]
impl ContestStore for SeaOrmStore {
    async fn entry_ids(&self, contest_id: ContestId) -> Result<Vec<EntryId>, StoreError> {
        entry::Entity::find()
            .select_only()
            .column(entry::Column::Id)
            .filter(entry::Column::ContestId.eq(contest_id))
            .into_tuple::<i32>()
            .all(&self.db)
            .await
            .map_err(store_error)
    }

    async fn entries(
        &self,
        contest_id: ContestId,
        statuses: &[EntryStatus],
    ) -> Result<Vec<Entry>, StoreError> {
        let models = entry::Entity::find()
            .filter(entry::Column::ContestId.eq(contest_id))
            .filter(entry::Column::Status.is_in(statuses.iter().copied()))
            .order_by_asc(entry::Column::Id)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(models.into_iter().map(Entry::from).collect())
    }

    async fn judge_scores(&self, entry_ids: &[EntryId]) -> Result<Vec<JudgeScore>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = judge_score::Entity::find()
            .filter(judge_score::Column::EntryId.is_in(entry_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(models.into_iter().map(JudgeScore::from).collect())
    }

    async fn public_votes(&self, entry_ids: &[EntryId]) -> Result<Vec<PublicVote>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = public_vote::Entity::find()
            .filter(public_vote::Column::EntryId.is_in(entry_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(store_error)?;
        Ok(models.into_iter().map(PublicVote::from).collect())
    }
}
