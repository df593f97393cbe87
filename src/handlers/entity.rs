//! Entity handlers: list, read, create, update, delete. The entity is resolved from the path segment.

use crate::error::AppError;
use crate::response::{msg_created, success_many, success_one};
use crate::schema::{Operation, ResolvedEntity};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    /// Comma-separated relationship names, e.g. `addresses,orders`.
    pub include: Option<String>,
}

impl ReadParams {
    fn include_names(&self) -> Vec<&str> {
        self.include
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|n| !n.is_empty()).collect())
            .unwrap_or_default()
    }
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse::<i32>()
        .map(i64::from)
        .map_err(|_| AppError::InvalidId)
}

fn entity_for<'a>(state: &'a AppState, path_segment: &str, op: Operation) -> Result<&'a ResolvedEntity, AppError> {
    let entity = state
        .model
        .entity_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound("Resource".into()))?;
    if !entity.allows(op) {
        return Err(AppError::MethodNotAllowed(op.as_str()));
    }
    Ok(entity)
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v).map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<ReadParams>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, Operation::List)?;
    let includes = CrudService::resolve_includes(&state.model, entity, &params.include_names())?;
    let rows = CrudService::list(&state.pool, entity, &includes).await?;
    Ok(success_many(rows))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    Query(params): Query<ReadParams>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, Operation::Read)?;
    let id = parse_id(&id_str)?;
    let includes = CrudService::resolve_includes(&state.model, entity, &params.include_names())?;
    let row = CrudService::read(&state.pool, entity, id, &includes)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.label.clone()))?;
    Ok(success_one(row))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, Operation::Create)?;
    let body = json_body(body)?;
    let row = CrudService::create(&state.pool, &state.model, entity, body).await?;
    let id = row.get("id").and_then(Value::as_i64);
    Ok(msg_created(format!("{} created successfully", entity.label), id))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, Operation::Update)?;
    let id = parse_id(&id_str)?;
    let body = match json_body(body) {
        Ok(body) => body,
        Err(e) => {
            if CrudService::exists_by_id(&state.pool, entity, id).await? {
                return Err(e);
            }
            return Err(AppError::NotFound(entity.label.clone()));
        }
    };
    CrudService::update(&state.pool, &state.model, entity, id, body)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.label.clone()))?;
    Ok(msg_created(format!("{} updated successfully", entity.label), None))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment, Operation::Delete)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.pool, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(entity.label.clone()))?;
    Ok(msg_created(format!("{} deleted successfully", entity.label), None))
}
