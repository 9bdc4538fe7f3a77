use std::sync::Arc;

use common::{ContestId, ContestStore, EntryStatus};
use tracing::{debug, instrument};

use crate::aggregation::{self, EntryListing};
use crate::error::LoadError;
use crate::live::ContestViews;
use crate::ranking::{self, RankedEntry, RankingStrategy};

/// Read path for contest views.
///
/// Serves the cached value while it is fresh and recomputes from the store
/// otherwise. A failed fetch leaves the cached value untouched; it stays
/// available through `last_known_*` for stale display.
#[derive(Clone)]
pub struct ResultsLoader {
    store: Arc<dyn ContestStore>,
    strategy: Arc<dyn RankingStrategy>,
}

impl ResultsLoader {
    pub fn new(store: Arc<dyn ContestStore>, strategy: Arc<dyn RankingStrategy>) -> Self {
        Self { store, strategy }
    }

    pub fn strategy(&self) -> &dyn RankingStrategy {
        self.strategy.as_ref()
    }

    /// Ranked results of the contest.
    #[instrument(skip(self, views))]
    pub async fn results(
        &self,
        views: &ContestViews,
        contest_id: ContestId,
    ) -> Result<Vec<RankedEntry>, LoadError> {
        let snapshot = views.results(contest_id);
        let version = snapshot.version;
        if let Some(cached) = snapshot.fresh_value() {
            return Ok(cached);
        }

        let entries = self.store.entries(contest_id, EntryStatus::RANKED).await?;
        let entry_ids: Vec<_> = entries.iter().map(|entry| entry.id).collect();
        let (scores, votes) = tokio::try_join!(
            self.store.judge_scores(&entry_ids),
            self.store.public_votes(&entry_ids),
        )?;

        let ranked = ranking::rank(
            aggregation::aggregate(&entries, &scores, &votes),
            self.strategy.as_ref(),
        );
        debug!(
            entries = ranked.len(),
            strategy = self.strategy.name(),
            "Recomputed results"
        );
        views.store_results(contest_id, version, ranked.clone());
        Ok(ranked)
    }

    /// Public entry listing of the contest.
    #[instrument(skip(self, views))]
    pub async fn entries(
        &self,
        views: &ContestViews,
        contest_id: ContestId,
    ) -> Result<Vec<EntryListing>, LoadError> {
        let snapshot = views.entries(contest_id);
        let version = snapshot.version;
        if let Some(cached) = snapshot.fresh_value() {
            return Ok(cached);
        }

        let entries = self.store.entries(contest_id, EntryStatus::RANKED).await?;
        let entry_ids: Vec<_> = entries.iter().map(|entry| entry.id).collect();
        let votes = self.store.public_votes(&entry_ids).await?;

        let listings = aggregation::listings(&entries, &votes);
        debug!(entries = listings.len(), "Recomputed entry listing");
        views.store_entries(contest_id, version, listings.clone());
        Ok(listings)
    }

    /// The most recent results, fresh or not.
    pub fn last_known_results(
        &self,
        views: &ContestViews,
        contest_id: ContestId,
    ) -> Option<Vec<RankedEntry>> {
        views.results(contest_id).value
    }

    /// The most recent entry listing, fresh or not.
    pub fn last_known_entries(
        &self,
        views: &ContestViews,
        contest_id: ContestId,
    ) -> Option<Vec<EntryListing>> {
        views.entries(contest_id).value
    }
}
