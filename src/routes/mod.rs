//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::settings::Settings;
use crate::state::AppState;
use axum::Router;
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Limits applied to every request.
#[derive(Clone, Copy, Debug)]
pub struct RequestLimits {
    pub timeout: Duration,
    pub max_in_flight: usize,
    pub body_limit_bytes: usize,
}

impl From<&Settings> for RequestLimits {
    fn from(s: &Settings) -> Self {
        RequestLimits {
            timeout: s.request_timeout,
            max_in_flight: s.max_in_flight_requests,
            body_limit_bytes: s.body_limit_bytes,
        }
    }
}

/// Full application: common routes at the root, entity routes under `/api`.
pub fn app(state: AppState, limits: RequestLimits) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", entity_routes(state))
        .layer(GlobalConcurrencyLimitLayer::new(limits.max_in_flight))
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .layer(TimeoutLayer::new(limits.timeout))
        .layer(TraceLayer::new_for_http())
}
