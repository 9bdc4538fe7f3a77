use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ChangeEvent, Row};
use sea_orm::*;
use tracing::{debug, instrument};

use crate::entity::{entry, judge_score, public_vote};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::contest::EntryResponse;
use crate::models::entry::*;
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/{id}/votes",
    tag = "Entries",
    operation_id = "castVote",
    summary = "Cast or change a public vote",
    description = "Records the voter's score for the entry. A voter has one vote per entry; voting again replaces the previous score and comment.",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body = CastVoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = VoteResponse),
        (status = 200, description = "Existing vote replaced", body = VoteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent first vote (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(entry_id = id, voter_id = payload.voter_id))]
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CastVoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_cast_vote(&payload)?;
    find_ranked_entry(&state.db, id).await?;

    let existing = public_vote::Entity::find()
        .filter(public_vote::Column::EntryId.eq(id))
        .filter(public_vote::Column::VoterId.eq(payload.voter_id))
        .one(&state.db)
        .await?;

    if let Some(model) = existing {
        let old_row = Row::PublicVote(model.clone().into());
        let mut active: public_vote::ActiveModel = model.into();
        active.score = Set(payload.score);
        active.comment = Set(payload.comment);
        let updated = active.update(&state.db).await?;

        state.feed.publish(ChangeEvent::updated(
            Some(old_row),
            Row::PublicVote(updated.clone().into()),
        ));
        debug!(vote_id = updated.id, "Replaced public vote");
        return Ok((StatusCode::OK, Json(VoteResponse::from(updated))));
    }

    let new_vote = public_vote::ActiveModel {
        entry_id: Set(id),
        voter_id: Set(payload.voter_id),
        score: Set(payload.score),
        comment: Set(payload.comment),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_vote.insert(&state.db).await {
        Ok(model) => {
            state
                .feed
                .publish(ChangeEvent::inserted(Row::PublicVote(model.clone().into())));
            Ok((StatusCode::CREATED, Json(VoteResponse::from(model))))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
            AppError::Conflict("Vote was recorded concurrently, retry to replace it".into()),
        ),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    put,
    path = "/{id}/scores",
    tag = "Entries",
    operation_id = "submitScore",
    summary = "Submit or revise a judge score",
    description = "Records the judge's overall score (0-100) for the entry. A judge has one score per entry; submitting again replaces it.",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body = SubmitScoreRequest,
    responses(
        (status = 201, description = "Score recorded", body = ScoreResponse),
        (status = 200, description = "Existing score replaced", body = ScoreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent first score (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(entry_id = id, judge_id = payload.judge_id))]
pub async fn submit_score(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SubmitScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_submit_score(&payload)?;
    find_ranked_entry(&state.db, id).await?;

    let existing = judge_score::Entity::find()
        .filter(judge_score::Column::EntryId.eq(id))
        .filter(judge_score::Column::JudgeId.eq(payload.judge_id))
        .one(&state.db)
        .await?;

    if let Some(model) = existing {
        let old_row = Row::JudgeScore(model.clone().into());
        let mut active: judge_score::ActiveModel = model.into();
        active.overall_score = Set(payload.overall_score);
        let updated = active.update(&state.db).await?;

        state.feed.publish(ChangeEvent::updated(
            Some(old_row),
            Row::JudgeScore(updated.clone().into()),
        ));
        debug!(score_id = updated.id, "Replaced judge score");
        return Ok((StatusCode::OK, Json(ScoreResponse::from(updated))));
    }

    let new_score = judge_score::ActiveModel {
        entry_id: Set(id),
        judge_id: Set(payload.judge_id),
        overall_score: Set(payload.overall_score),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_score.insert(&state.db).await {
        Ok(model) => {
            state
                .feed
                .publish(ChangeEvent::inserted(Row::JudgeScore(model.clone().into())));
            Ok((StatusCode::CREATED, Json(ScoreResponse::from(model))))
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
            AppError::Conflict("Score was recorded concurrently, retry to replace it".into()),
        ),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    patch,
    path = "/{id}/status",
    tag = "Entries",
    operation_id = "updateEntryStatus",
    summary = "Move an entry through its lifecycle",
    description = "Sets the entry status. Entries enter the results when `approved` or `archived` and leave them otherwise.",
    params(("id" = i32, Path, description = "Entry ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = EntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(entry_id = id, status = %payload.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<EntryResponse>, AppError> {
    let model = find_entry(&state.db, id).await?;
    if model.status == payload.status {
        return Ok(Json(EntryResponse::from(model)));
    }

    let old_row = Row::Entry(model.clone().into());
    let mut active: entry::ActiveModel = model.into();
    active.status = Set(payload.status);
    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(&state.db).await?;

    state.feed.publish(ChangeEvent::updated(
        Some(old_row),
        Row::Entry(updated.clone().into()),
    ));

    Ok(Json(EntryResponse::from(updated)))
}

async fn find_entry<C: ConnectionTrait>(db: &C, id: i32) -> Result<entry::Model, AppError> {
    entry::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Entry not found".into()))
}

/// Entries outside the ranked statuses cannot be scored or voted on.
async fn find_ranked_entry<C: ConnectionTrait>(db: &C, id: i32) -> Result<entry::Model, AppError> {
    let model = find_entry(db, id).await?;
    if !model.status.is_ranked() {
        return Err(AppError::Validation(format!(
            "Entry is {} and does not accept scores or votes",
            model.status
        )));
    }
    Ok(model)
}
