//! Response helpers. Reads return bare records/arrays; writes return `{ "msg": ... }`.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct MsgBody {
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

/// 201 with a message; `id` is set for creates.
pub fn msg_created(msg: String, id: Option<i64>) -> (StatusCode, Json<MsgBody>) {
    (StatusCode::CREATED, Json(MsgBody { msg, id }))
}

pub fn success_one(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(data))
}

pub fn success_many(data: Vec<Value>) -> (StatusCode, Json<Vec<Value>>) {
    (StatusCode::OK, Json(data))
}
