//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: table {table} column {column}")]
    InvalidPrimaryKey { table: String, column: String },
    #[error("duplicate table: {0}")]
    DuplicateTable(String),
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("duplicate include '{name}' on table {table}")]
    DuplicateInclude { table: String, name: String },
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Invalid ID")]
    InvalidId,
    /// Carries the entity label, e.g. "User".
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} not allowed")]
    MethodNotAllowed(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// Classify a store error raised by an insert or update.
    pub fn from_write(e: sqlx::Error) -> Self {
        let Some(db) = e.as_database_error() else {
            return AppError::Db(e);
        };
        match db.kind() {
            ErrorKind::ForeignKeyViolation => {
                AppError::Validation(format!("referenced record does not exist ({})", db.constraint().unwrap_or("foreign key")))
            }
            ErrorKind::UniqueViolation => AppError::Conflict(db.message().to_string()),
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => AppError::Validation(db.message().to_string()),
            _ if is_data_exception(db.code().as_deref()) => AppError::Validation(db.message().to_string()),
            _ => AppError::Db(e),
        }
    }

    /// Classify a store error raised by a delete of a `label` row.
    pub fn from_delete(e: sqlx::Error, label: &str) -> Self {
        match e.as_database_error().map(|db| db.kind()) {
            Some(ErrorKind::ForeignKeyViolation) => {
                AppError::Conflict(format!("{} is still referenced by other records", label))
            }
            _ => AppError::Db(e),
        }
    }
}

/// SQLSTATE class 22: bad text representation, numeric overflow, bad datetime.
fn is_data_exception(code: Option<&str>) -> bool {
    code.is_some_and(|c| c.starts_with("22"))
}

fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid ID").into_response(),
            AppError::NotFound(label) => (StatusCode::NOT_FOUND, format!("{} not found", label)).into_response(),
            AppError::Validation(m) | AppError::BadRequest(m) => json_error(StatusCode::BAD_REQUEST, m),
            e @ AppError::MethodNotAllowed(_) => json_error(StatusCode::METHOD_NOT_ALLOWED, e.to_string()),
            AppError::Conflict(m) => json_error(StatusCode::CONFLICT, m),
            AppError::Db(sqlx::Error::PoolTimedOut) => {
                tracing::warn!("connection pool exhausted");
                json_error(StatusCode::SERVICE_UNAVAILABLE, "database busy".into())
            }
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal database error".into())
            }
            AppError::Schema(e) => {
                tracing::error!(error = %e, "schema error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (AppError::InvalidId, StatusCode::BAD_REQUEST),
            (AppError::NotFound("User".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("name is required".into()), StatusCode::BAD_REQUEST),
            (AppError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST),
            (AppError::MethodNotAllowed("create"), StatusCode::METHOD_NOT_ALLOWED),
            (AppError::Conflict("in use".into()), StatusCode::CONFLICT),
            (AppError::Db(sqlx::Error::PoolTimedOut), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Db(sqlx::Error::PoolClosed), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn messages_match_wire_text() {
        assert_eq!(AppError::InvalidId.to_string(), "Invalid ID");
        assert_eq!(AppError::NotFound("User".into()).to_string(), "User not found");
        assert_eq!(AppError::MethodNotAllowed("delete").to_string(), "delete not allowed");
    }

    #[test]
    fn non_database_errors_pass_through() {
        assert!(matches!(AppError::from_write(sqlx::Error::PoolClosed), AppError::Db(_)));
        assert!(matches!(
            AppError::from_delete(sqlx::Error::RowNotFound, "User"),
            AppError::Db(sqlx::Error::RowNotFound)
        ));
    }

    #[test]
    fn data_exception_class() {
        assert!(is_data_exception(Some("22P02")));
        assert!(is_data_exception(Some("22003")));
        assert!(!is_data_exception(Some("23503")));
        assert!(!is_data_exception(None));
    }
}
