use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ChangeEvent, Row};
use sea_orm::*;
use tracing::{debug, instrument};

use crate::entity::{contest, entry};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::contest::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Contests",
    operation_id = "createContest",
    summary = "Create a new contest",
    request_body = CreateContestRequest,
    responses(
        (status = 201, description = "Contest created", body = ContestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_contest(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateContestRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_contest(&payload)?;

    let new_contest = contest::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_contest.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(ContestResponse::from(model))))
}

#[utoipa::path(
    post,
    path = "/{id}/entries",
    tag = "Entries",
    operation_id = "createEntry",
    summary = "Submit an entry to a contest",
    description = "Creates an entry in `draft` status unless another status is given. Entries only appear in results once `approved` or `archived`.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(contest_id = id, name = %payload.name))]
pub async fn create_entry(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_entry(&payload)?;
    find_contest(&state.db, id).await?;

    let now = chrono::Utc::now();
    let new_entry = entry::ActiveModel {
        contest_id: Set(id),
        producer_id: Set(payload.producer_id),
        name: Set(payload.name.trim().to_string()),
        category: Set(payload.category.trim().to_string()),
        thc_percent: Set(payload.thc_percent),
        cbd_percent: Set(payload.cbd_percent),
        terpene_percent: Set(payload.terpene_percent),
        status: Set(payload.status.unwrap_or_default()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_entry.insert(&state.db).await?;

    let delivered = state
        .feed
        .publish(ChangeEvent::inserted(Row::Entry(model.clone().into())));
    debug!(entry_id = model.id, delivered, "Published entry insert");

    Ok((StatusCode::CREATED, Json(EntryResponse::from(model))))
}

pub(crate) async fn find_contest<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<contest::Model, AppError> {
    contest::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contest not found".into()))
}
