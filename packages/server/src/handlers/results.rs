use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use results_core::{LoadError, Paginator, ViewKind};
use tracing::{instrument, warn};

use super::contest::find_contest;
use crate::error::{AppError, ErrorBody};
use crate::models::results::*;
use crate::models::shared::{PageQuery, Pagination};
use crate::state::AppState;
use crate::watchers::ContestWatch;

/// A loaded view together with how it was obtained.
struct Loaded<T> {
    items: Vec<T>,
    stale: bool,
    live: bool,
}

/// A failed refetch falls back to the last value known, flagged stale. With
/// nothing cached the failure is returned.
fn resolve<T>(
    contest_id: i32,
    watch: &ContestWatch,
    loaded: Result<Vec<T>, LoadError>,
    last_known: impl FnOnce() -> Option<Vec<T>>,
) -> Result<Loaded<T>, AppError> {
    let live = watch.status().is_live();
    match loaded {
        Ok(items) => Ok(Loaded {
            items,
            stale: false,
            live,
        }),
        Err(e) => match last_known() {
            Some(items) => {
                warn!(contest_id, error = %e, "Serving last known view");
                Ok(Loaded {
                    items,
                    stale: true,
                    live,
                })
            }
            None => Err(e.into()),
        },
    }
}

/// Start watching the contest. Views of a watch that is not live are
/// invalidated so the read refetches.
fn prepare(state: &AppState, contest_id: i32) -> Arc<ContestWatch> {
    let watch = state.watches.ensure(contest_id);
    if !watch.status().is_live() {
        watch.views().invalidate(contest_id, ViewKind::ALL);
    }
    watch
}

fn page_size(state: &AppState, query: &PageQuery) -> (usize, usize) {
    let results = &state.config.results;
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query
        .per_page
        .unwrap_or(results.default_per_page)
        .clamp(1, results.max_per_page.max(1));
    (page as usize, per_page as usize)
}

#[utoipa::path(
    get,
    path = "/{id}/results",
    tag = "Results",
    operation_id = "getContestResults",
    summary = "Ranked contest results",
    description = "Returns one page of the contest's approved and archived entries, ranked by the configured rule. Tied entries share a rank; entries without a score sort last with a `null` rank. A page past the end returns the first page.\n\nResults are kept current through the change feed. When the feed is down the results are refetched on every read, and if that fails the last known results are returned with `stale: true`.",
    params(("id" = i32, Path, description = "Contest ID"), PageQuery),
    responses(
        (status = 200, description = "Ranked results", body = ResultsResponse),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Store unavailable and nothing cached (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ResultsResponse>, AppError> {
    let (page, per_page) = page_size(&state, &query);
    find_contest(&state.db, id).await?;

    let watch = prepare(&state, id);
    let loaded = state.loader.results(watch.views(), id).await;
    let Loaded { items, stale, live } = resolve(id, &watch, loaded, || {
        state.loader.last_known_results(watch.views(), id)
    })?;

    let mut pager = Paginator::new(items, per_page);
    pager.go_to_page(page);

    Ok(Json(ResultsResponse {
        contest_id: id,
        ranking: state.loader.strategy().name(),
        data: pager.page().items.iter().map(RankedEntryResponse::from).collect(),
        pagination: Pagination::from(pager.window()),
        page_numbers: pager.page_numbers(),
        stale,
        live,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/entries",
    tag = "Results",
    operation_id = "getContestEntries",
    summary = "Public entry listing",
    description = "Returns one page of the contest's approved and archived entries in submission order, with their public vote averages. Staleness follows the same rules as the results endpoint.",
    params(("id" = i32, Path, description = "Contest ID"), PageQuery),
    responses(
        (status = 200, description = "Entry listing", body = EntriesResponse),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Store unavailable and nothing cached (UPSTREAM_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_entries(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<EntriesResponse>, AppError> {
    let (page, per_page) = page_size(&state, &query);
    find_contest(&state.db, id).await?;

    let watch = prepare(&state, id);
    let loaded = state.loader.entries(watch.views(), id).await;
    let Loaded { items, stale, live } = resolve(id, &watch, loaded, || {
        state.loader.last_known_entries(watch.views(), id)
    })?;

    let mut pager = Paginator::new(items, per_page);
    pager.go_to_page(page);

    Ok(Json(EntriesResponse {
        contest_id: id,
        data: pager.page().items.iter().map(EntryListingResponse::from).collect(),
        pagination: Pagination::from(pager.window()),
        page_numbers: pager.page_numbers(),
        stale,
        live,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/live",
    tag = "Results",
    operation_id = "getContestLiveStatus",
    summary = "Live update status",
    description = "Reports whether the contest's views are being kept current by the change feed. Starts watching the contest if it was not watched yet, and restarts a watch that gave up.",
    params(("id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Watch status", body = LiveStatusResponse),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_live(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<LiveStatusResponse>, AppError> {
    find_contest(&state.db, id).await?;

    let watch = state.watches.ensure(id);
    Ok(Json(LiveStatusResponse::new(
        id,
        watch.status(),
        watch.views().invalidation_count(),
    )))
}
