use chrono::{DateTime, Utc};
use common::EntryStatus;
use common::model::{validate_judge_score, validate_public_vote};
use serde::{Deserialize, Serialize};

use crate::entity::{judge_score, public_vote};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CastVoteRequest {
    pub voter_id: i32,
    /// 1 to 5.
    #[schema(example = 4.0)]
    pub score: f64,
    pub comment: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitScoreRequest {
    pub judge_id: i32,
    /// 0 to 100.
    #[schema(example = 87.5)]
    pub overall_score: f64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: EntryStatus,
}

pub fn validate_cast_vote(req: &CastVoteRequest) -> Result<(), AppError> {
    validate_public_vote(req.score).map_err(AppError::Validation)?;
    if let Some(comment) = &req.comment
        && comment.chars().count() > 2000
    {
        return Err(AppError::Validation(
            "Comment must be at most 2000 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_submit_score(req: &SubmitScoreRequest) -> Result<(), AppError> {
    validate_judge_score(req.overall_score).map_err(AppError::Validation)
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct VoteResponse {
    pub id: i32,
    pub entry_id: i32,
    pub voter_id: i32,
    pub score: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<public_vote::Model> for VoteResponse {
    fn from(m: public_vote::Model) -> Self {
        Self {
            id: m.id,
            entry_id: m.entry_id,
            voter_id: m.voter_id,
            score: m.score,
            comment: m.comment,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreResponse {
    pub id: i32,
    pub entry_id: i32,
    pub judge_id: i32,
    pub overall_score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<judge_score::Model> for ScoreResponse {
    fn from(m: judge_score::Model) -> Self {
        Self {
            id: m.id,
            entry_id: m.entry_id,
            judge_id: m.judge_id,
            overall_score: m.overall_score,
            created_at: m.created_at,
        }
    }
}
