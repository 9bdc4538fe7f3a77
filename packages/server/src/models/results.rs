use common::EntryStatus;
use results_core::{EntryListing, PageMarker, RankedEntry, WatchPhase, WatchStatus};
use serde::Serialize;

use super::shared::Pagination;

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntrySummaryResponse {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub producer_id: i32,
    pub status: EntryStatus,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
}

impl From<&results_core::EntrySummary> for EntrySummaryResponse {
    fn from(e: &results_core::EntrySummary) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            category: e.category.clone(),
            producer_id: e.producer_id,
            status: e.status,
            thc_percent: e.thc_percent,
            cbd_percent: e.cbd_percent,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RankedEntryResponse {
    /// 1-based; tied entries share a rank. `null` when the entry has no score yet.
    pub rank: Option<u32>,
    /// The value entries are ordered by under the active ranking rule.
    pub score: Option<f64>,
    pub entry: EntrySummaryResponse,
    /// `null` when no judge has scored the entry.
    pub judge_average: Option<f64>,
    pub judge_count: u32,
    /// `null` when nobody has voted for the entry.
    pub public_average: Option<f64>,
    pub public_count: u32,
}

impl From<&RankedEntry> for RankedEntryResponse {
    fn from(r: &RankedEntry) -> Self {
        Self {
            rank: r.rank,
            score: r.score,
            entry: EntrySummaryResponse::from(&r.entry),
            judge_average: r.view.judge_average,
            judge_count: r.view.judge_count,
            public_average: r.view.public_average,
            public_count: r.view.public_count,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryListingResponse {
    pub entry: EntrySummaryResponse,
    pub public_average: Option<f64>,
    pub public_count: u32,
}

impl From<&EntryListing> for EntryListingResponse {
    fn from(l: &EntryListing) -> Self {
        Self {
            entry: EntrySummaryResponse::from(&l.entry),
            public_average: l.public_average,
            public_count: l.public_count,
        }
    }
}

/// A page of ranked results.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ResultsResponse {
    pub contest_id: i32,
    /// Ranking rule in effect: `judge`, `public` or `weighted`.
    #[schema(example = "judge")]
    pub ranking: &'static str,
    pub data: Vec<RankedEntryResponse>,
    pub pagination: Pagination,
    /// Page numbers to display, with `"ellipsis"` marking elided runs.
    #[schema(value_type = Vec<Object>, example = json!([1, 2, 3, 4, "ellipsis", 10]))]
    pub page_numbers: Vec<PageMarker>,
    /// The data could not be refreshed and is the last value known.
    pub stale: bool,
    /// Live updates are flowing for this contest.
    pub live: bool,
}

/// A page of the public entry listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EntriesResponse {
    pub contest_id: i32,
    pub data: Vec<EntryListingResponse>,
    pub pagination: Pagination,
    #[schema(value_type = Vec<Object>)]
    pub page_numbers: Vec<PageMarker>,
    pub stale: bool,
    pub live: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LiveStatusResponse {
    pub contest_id: i32,
    /// `unwatched`, `initializing` or `subscribed`.
    #[schema(example = "subscribed")]
    pub phase: String,
    pub degraded: bool,
    pub retry_required: bool,
    pub last_error: Option<String>,
    /// Number of view invalidations since the watch started.
    pub invalidations: u64,
}

impl LiveStatusResponse {
    pub fn new(contest_id: i32, status: WatchStatus, invalidations: u64) -> Self {
        let phase = match status.phase {
            WatchPhase::Unwatched => "unwatched",
            WatchPhase::Initializing => "initializing",
            WatchPhase::Subscribed => "subscribed",
        };
        Self {
            contest_id,
            phase: phase.to_string(),
            degraded: status.degraded,
            retry_required: status.retry_required,
            last_error: status.last_error,
            invalidations,
        }
    }
}
