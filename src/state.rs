//! Shared application state for all routes.

use crate::schema::ResolvedModel;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Resolved once at startup; read-only afterwards.
    pub model: Arc<ResolvedModel>,
}

impl AppState {
    pub fn new(pool: PgPool, model: ResolvedModel) -> Self {
        AppState {
            pool,
            model: Arc::new(model),
        }
    }
}
