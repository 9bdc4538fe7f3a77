use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EntryStatus;

pub type ContestId = i32;
pub type EntryId = i32;
pub type JudgeId = i32;
pub type VoterId = i32;
pub type ProducerId = i32;

/// Bounds of a judge's overall score.
pub const JUDGE_SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Bounds of a public vote.
pub const PUBLIC_VOTE_RANGE: RangeInclusive<f64> = 1.0..=5.0;

/// A product submitted to a contest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Entry {
    pub id: EntryId,
    pub contest_id: ContestId,
    pub producer_id: ProducerId,
    pub name: String,
    pub category: String,
    /// `None` when the producer did not report the value.
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub terpene_percent: Option<f64>,
    pub status: EntryStatus,
}

/// One judge's evaluation of one entry. At most one per (judge, entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JudgeScore {
    pub id: i32,
    pub entry_id: EntryId,
    pub judge_id: JudgeId,
    pub overall_score: f64,
    pub created_at: DateTime<Utc>,
}

/// One viewer's rating of one entry. Re-voting updates the existing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PublicVote {
    pub id: i32,
    pub entry_id: EntryId,
    pub voter_id: VoterId,
    pub score: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validate a judge score against [`JUDGE_SCORE_RANGE`].
pub fn validate_judge_score(score: f64) -> Result<(), String> {
    if !score.is_finite() || !JUDGE_SCORE_RANGE.contains(&score) {
        return Err(format!(
            "Judge score must be between {} and {}",
            JUDGE_SCORE_RANGE.start(),
            JUDGE_SCORE_RANGE.end()
        ));
    }
    Ok(())
}

/// Validate a public vote against [`PUBLIC_VOTE_RANGE`].
pub fn validate_public_vote(score: f64) -> Result<(), String> {
    if !score.is_finite() || !PUBLIC_VOTE_RANGE.contains(&score) {
        return Err(format!(
            "Vote must be between {} and {}",
            PUBLIC_VOTE_RANGE.start(),
            PUBLIC_VOTE_RANGE.end()
        ));
    }
    Ok(())
}
