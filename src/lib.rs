//! Food-delivery REST backend: a declared relational model served over axum with sqlx/PostgreSQL.

pub mod case;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, SchemaError, SettingsError};
pub use migration::apply_migrations;
pub use routes::{app, common_routes, entity_routes, RequestLimits};
pub use schema::{food_delivery, resolve, ResolvedEntity, ResolvedModel};
pub use service::CrudService;
pub use settings::Settings;
pub use state::AppState;
