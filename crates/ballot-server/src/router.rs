use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Ballot endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/users", post(handler::register_handler))
        .route(
            "/v1/sessions",
            post(handler::login_handler).delete(handler::logout_handler),
        )
        .route(
            "/v1/polls",
            get(handler::list_polls_handler).post(handler::create_poll_handler),
        )
        .route(
            "/v1/polls/:id",
            get(handler::get_poll_handler).delete(handler::delete_poll_handler),
        )
        .route("/v1/polls/:id/votes", post(handler::cast_vote_handler))
        .route("/v1/polls/:id/results", get(handler::results_handler))
        .route("/v1/polls/:id/voters", get(handler::voters_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
