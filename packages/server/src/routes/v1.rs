use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/contests", contest_routes())
        .nest("/entries", entry_routes())
}

fn contest_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::contest::create_contest))
        .routes(routes!(
            handlers::results::get_entries,
            handlers::contest::create_entry
        ))
        .routes(routes!(handlers::results::get_results))
        .routes(routes!(handlers::results::get_live))
}

fn entry_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::entry::cast_vote))
        .routes(routes!(handlers::entry::submit_score))
        .routes(routes!(handlers::entry::update_status))
}
