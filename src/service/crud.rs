//! Generic CRUD execution against PostgreSQL. Each operation is one statement;
//! writes to tables with foreign keys first probe the referenced rows.

use crate::case::value_keys_to_camel_case_recursive;
use crate::error::{AppError, SchemaError};
use crate::schema::{ResolvedEntity, ResolvedModel};
use crate::service::RequestValidator;
use crate::sql::{self, IncludeSelect, PgBindValue, QueryBuf, Record};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};

pub struct CrudService;

impl CrudService {
    /// Every row, ordered by primary key.
    pub async fn list(
        pool: &PgPool,
        entity: &ResolvedEntity,
        includes: &[IncludeSelect<'_>],
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_list(entity, includes);
        let rows = bind_all(&q)?.fetch_all(pool).await?;
        rows.iter().map(row_to_json).collect()
    }

    /// Fetch one row by primary key. `None` when absent.
    pub async fn read(
        pool: &PgPool,
        entity: &ResolvedEntity,
        id: i64,
        includes: &[IncludeSelect<'_>],
    ) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(entity, id, includes);
        let row = bind_all(&q)?.fetch_optional(pool).await?;
        row.as_ref().map(row_to_json).transpose()
    }

    /// Validate and insert one row. Returns the created row, including its new id.
    pub async fn create(
        pool: &PgPool,
        model: &ResolvedModel,
        entity: &ResolvedEntity,
        body: Value,
    ) -> Result<Value, AppError> {
        let record = RequestValidator::record_from_body(entity, body)?;
        RequestValidator::validate(entity, &record)?;
        Self::ensure_references(pool, model, entity, &record).await?;
        let q = sql::insert(entity, &record);
        let row = bind_all(&q)?
            .fetch_one(pool)
            .await
            .map_err(AppError::from_write)?;
        let created = row_to_json(&row)?;
        tracing::info!(table = %entity.table_name, id = ?created.get("id"), "created");
        Ok(created)
    }

    /// Update one row by id in a single conditional statement. `None` when the id does not exist,
    /// whatever the body holds: a rejected body is only reported for an existing row.
    pub async fn update(
        pool: &PgPool,
        model: &ResolvedModel,
        entity: &ResolvedEntity,
        id: i64,
        body: Value,
    ) -> Result<Option<Value>, AppError> {
        let record = match Self::checked_update_record(pool, model, entity, body).await {
            Ok(record) => record,
            Err(e @ (AppError::Validation(_) | AppError::BadRequest(_))) => {
                if !Self::exists_by_id(pool, entity, id).await? {
                    return Ok(None);
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let q = sql::update(entity, id, &record);
        let row = bind_all(&q)?
            .fetch_optional(pool)
            .await
            .map_err(AppError::from_write)?;
        row.as_ref().map(row_to_json).transpose()
    }

    pub async fn exists_by_id(pool: &PgPool, entity: &ResolvedEntity, id: i64) -> Result<bool, AppError> {
        Self::exists(pool, entity, &entity.pk_column, Value::from(id)).await
    }

    async fn checked_update_record(
        pool: &PgPool,
        model: &ResolvedModel,
        entity: &ResolvedEntity,
        body: Value,
    ) -> Result<Record, AppError> {
        let record = RequestValidator::record_from_body(entity, body)?;
        RequestValidator::validate_partial(entity, &record)?;
        Self::ensure_references(pool, model, entity, &record).await?;
        Ok(record)
    }

    /// Delete one row by id in a single statement. Returns the deleted id, `None` when absent.
    /// Rows still referenced through a RESTRICT foreign key are reported as a conflict.
    pub async fn delete(pool: &PgPool, entity: &ResolvedEntity, id: i64) -> Result<Option<i64>, AppError> {
        let q = sql::delete(entity, id);
        let row = bind_all(&q)?
            .fetch_optional(pool)
            .await
            .map_err(|e| AppError::from_delete(e, &entity.label))?;
        if row.is_some() {
            tracing::info!(table = %entity.table_name, id, "deleted");
        }
        Ok(row.map(|_| id))
    }

    /// Resolve `?include=` names against the entity's relationship graph.
    pub fn resolve_includes<'a>(
        model: &'a ResolvedModel,
        entity: &'a ResolvedEntity,
        names: &[&str],
    ) -> Result<Vec<IncludeSelect<'a>>, AppError> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let spec = entity.include(name).ok_or_else(|| {
                AppError::BadRequest(format!("unknown include '{}' for {}", name, entity.table_name))
            })?;
            let related = model.entity(&spec.related_table).ok_or_else(|| SchemaError::MissingReference {
                kind: "table",
                id: spec.related_table.clone(),
            })?;
            out.push(IncludeSelect {
                name: &spec.name,
                direction: spec.direction,
                related,
                our_key: &spec.our_key_column,
                their_key: &spec.their_key_column,
            });
        }
        Ok(out)
    }

    /// Every non-null foreign key in `record` must point at an existing row.
    async fn ensure_references(
        pool: &PgPool,
        model: &ResolvedModel,
        entity: &ResolvedEntity,
        record: &Record,
    ) -> Result<(), AppError> {
        for fk in &entity.references {
            let Some(value) = record.get(&fk.column).filter(|v| !v.is_null()) else {
                continue;
            };
            let parent = model.entity(&fk.parent_table).ok_or_else(|| SchemaError::MissingReference {
                kind: "table",
                id: fk.parent_table.clone(),
            })?;
            if !Self::exists(pool, parent, &fk.parent_column, value.clone()).await? {
                return Err(AppError::Validation(format!("{} {} does not exist", parent.label, value)));
            }
        }
        Ok(())
    }

    async fn exists(pool: &PgPool, entity: &ResolvedEntity, column: &str, value: Value) -> Result<bool, AppError> {
        let q = sql::exists_by_column(entity, column, value);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, bool>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p)?);
        }
        Ok(query.fetch_one(pool).await?)
    }
}

fn bind_all(q: &QueryBuf) -> Result<sqlx::query::Query<'_, Postgres, PgArguments>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_json(p)?);
    }
    Ok(query)
}

/// Decode a row into a JSON object with camelCase keys.
fn row_to_json(row: &PgRow) -> Result<Value, AppError> {
    use sqlx::{Column, Row};
    let mut map = serde_json::Map::new();
    for (idx, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, idx)?);
    }
    let mut value = Value::Object(map);
    value_keys_to_camel_case_recursive(&mut value);
    Ok(value)
}

fn cell_to_value(row: &PgRow, idx: usize) -> Result<Value, sqlx::Error> {
    use sqlx::{Row, TypeInfo, ValueRef};
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    Ok(match type_name.as_str() {
        "INT2" => Value::from(row.try_get::<i16, _>(idx)?),
        "INT4" => Value::from(row.try_get::<i32, _>(idx)?),
        "INT8" => Value::from(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => Value::from(row.try_get::<f32, _>(idx)? as f64),
        "FLOAT8" => Value::from(row.try_get::<f64, _>(idx)?),
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "TIMESTAMP" => Value::String(
            row.try_get::<chrono::NaiveDateTime, _>(idx)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "TIMESTAMPTZ" => Value::String(row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?.to_rfc3339()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx)?,
        _ => Value::String(row.try_get::<String, _>(idx)?),
    })
}
