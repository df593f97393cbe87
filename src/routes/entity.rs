//! Entity routes. Paths are parameterized so one set of handlers serves every exposed entity;
//! each handler resolves the entity by path segment and checks the operation is enabled.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

async fn greeting() -> &'static str {
    "Food delivery API"
}

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/:path_segment", get(list).post(create))
        .route("/:path_segment/:id", get(read).put(update).delete(delete_handler))
        .with_state(state)
}
