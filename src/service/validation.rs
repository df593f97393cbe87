//! Request validation: wire keys to columns, value shapes, and per-column rules.

use crate::error::AppError;
use crate::schema::{ColumnInfo, ColumnType, ResolvedEntity, ValidationRule};
use crate::sql::Record;
use regex::Regex;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Map a JSON object body onto entity columns. Keys may be camelCase or column names;
    /// unknown keys and the primary key are dropped. Timestamps with an offset are shifted to UTC.
    pub fn record_from_body(entity: &ResolvedEntity, body: Value) -> Result<Record, AppError> {
        let Value::Object(map) = body else {
            return Err(AppError::BadRequest("body must be a JSON object".into()));
        };
        let mut record = Record::new();
        for (key, value) in map {
            match entity.column_for_key(&key) {
                Some(c) if !c.is_pk => {
                    let value = match (c.column_type, value.as_str().and_then(utc_timestamp)) {
                        (ColumnType::Timestamp, Some(utc)) => Value::String(utc),
                        _ => value,
                    };
                    record.insert(c.name.clone(), value);
                }
                Some(_) => {}
                None => tracing::debug!(table = %entity.table_name, key = %key, "ignoring unknown field"),
            }
        }
        Ok(record)
    }

    /// Validate a record for insert. All required columns must be present and non-null.
    pub fn validate(entity: &ResolvedEntity, record: &Record) -> Result<(), AppError> {
        for (col, rule) in &entity.validation {
            let val = record.get(col);
            if rule.required == Some(true) && val.map_or(true, Value::is_null) {
                return Err(AppError::Validation(format!("{} is required", api_name(entity, col))));
            }
        }
        Self::validate_partial(entity, record)
    }

    /// Validate only the fields present (for update). A required column may not be set to null.
    pub fn validate_partial(entity: &ResolvedEntity, record: &Record) -> Result<(), AppError> {
        for (col, v) in record {
            let Some(info) = entity.column(col) else { continue };
            let rule = entity.validation.get(col);
            if v.is_null() {
                if !info.nullable || rule.is_some_and(|r| r.required == Some(true)) {
                    return Err(AppError::Validation(format!("{} must not be null", info.api_name)));
                }
                continue;
            }
            validate_shape(info, v)?;
            if let Some(rule) = rule {
                validate_field(&info.api_name, v, rule, entity.patterns.get(col))?;
            }
        }
        Ok(())
    }
}

fn api_name<'a>(entity: &'a ResolvedEntity, col: &'a str) -> &'a str {
    entity.column(col).map(|c| c.api_name.as_str()).unwrap_or(col)
}

fn validate_shape(col: &ColumnInfo, v: &Value) -> Result<(), AppError> {
    let ok = match col.column_type {
        ColumnType::Serial | ColumnType::Integer => v.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
        ColumnType::Boolean => v.is_boolean(),
        ColumnType::Varchar => v.is_string(),
        ColumnType::Timestamp => v.as_str().is_some_and(is_timestamp),
    };
    if ok {
        return Ok(());
    }
    let expected = match col.column_type {
        ColumnType::Serial | ColumnType::Integer => "an integer",
        ColumnType::Boolean => "a boolean",
        ColumnType::Varchar => "a string",
        ColumnType::Timestamp => "an ISO-8601 timestamp",
    };
    Err(AppError::Validation(format!("{} must be {}", col.api_name, expected)))
}

/// `TIMESTAMP` columns carry no zone; an RFC 3339 value is stored as its UTC wall time.
fn utc_timestamp(s: &str) -> Option<String> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn is_timestamp(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule, pattern: Option<&Regex>) -> Result<(), AppError> {
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!("{} must be at least {} characters", col, min)));
            }
        }
        if let Some(re) = pattern {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(allowed) = &rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), AppError> {
    if format.eq_ignore_ascii_case("email") {
        let valid = v.as_str().is_some_and(|s| match s.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        });
        if !valid {
            return Err(AppError::Validation(format!("{} must be a valid email", col)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{food_delivery, resolve, ResolvedModel};
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&food_delivery("public")).unwrap()
    }

    fn err_message(r: Result<(), AppError>) -> String {
        match r {
            Err(AppError::Validation(m)) => m,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn maps_camel_case_keys_and_drops_id() {
        let m = model();
        let users = m.entity("users").unwrap();
        let rec = RequestValidator::record_from_body(
            users,
            json!({"id": 5, "name": "Ada", "contactPhone": "0712345678", "nickname": "x"}),
        )
        .unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec["name"], json!("Ada"));
        assert_eq!(rec["contact_phone"], json!("0712345678"));
    }

    #[test]
    fn body_must_be_object() {
        let m = model();
        let err = RequestValidator::record_from_body(m.entity("users").unwrap(), json!([1])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn required_fields_on_create() {
        let m = model();
        let users = m.entity("users").unwrap();
        let rec = RequestValidator::record_from_body(users, json!({"name": "Ada"})).unwrap();
        assert_eq!(err_message(RequestValidator::validate(users, &rec)), "email is required");

        let rec = RequestValidator::record_from_body(users, json!({"name": "Ada", "email": "ada@x.com"})).unwrap();
        RequestValidator::validate(users, &rec).unwrap();
    }

    #[test]
    fn partial_allows_missing_required_but_not_null() {
        let m = model();
        let users = m.entity("users").unwrap();
        let rec = RequestValidator::record_from_body(users, json!({"emailVerified": true})).unwrap();
        RequestValidator::validate_partial(users, &rec).unwrap();

        let rec = RequestValidator::record_from_body(users, json!({"name": null})).unwrap();
        assert_eq!(err_message(RequestValidator::validate_partial(users, &rec)), "name must not be null");
    }

    #[test]
    fn checks_value_shapes() {
        let m = model();
        let address = m.entity("address").unwrap();
        let rec = RequestValidator::record_from_body(address, json!({"cityId": "three"})).unwrap();
        assert_eq!(err_message(RequestValidator::validate_partial(address, &rec)), "cityId must be an integer");

        let rec = RequestValidator::record_from_body(address, json!({"cityId": 3_000_000_000_i64})).unwrap();
        assert!(RequestValidator::validate_partial(address, &rec).is_err());

        let orders = m.entity("orders").unwrap();
        let rec = RequestValidator::record_from_body(orders, json!({"estimatedDeliveryTime": "soon"})).unwrap();
        assert!(RequestValidator::validate_partial(orders, &rec).is_err());
        let rec =
            RequestValidator::record_from_body(orders, json!({"estimatedDeliveryTime": "2024-05-01T12:30:00"})).unwrap();
        RequestValidator::validate_partial(orders, &rec).unwrap();
    }

    #[test]
    fn shifts_offset_timestamps_to_utc() {
        let m = model();
        let orders = m.entity("orders").unwrap();
        let rec = RequestValidator::record_from_body(
            orders,
            json!({
                "estimatedDeliveryTime": "2024-05-01T12:30:00+03:00",
                "actualDeliveryTime": "2024-05-01T12:30:00.250Z",
                "comment": "2024-05-01T12:30:00+03:00"
            }),
        )
        .unwrap();
        assert_eq!(rec["estimated_delivery_time"], json!("2024-05-01T09:30:00"));
        assert_eq!(rec["actual_delivery_time"], json!("2024-05-01T12:30:00.250"));
        assert_eq!(rec["comment"], json!("2024-05-01T12:30:00+03:00"));
        RequestValidator::validate_partial(orders, &rec).unwrap();

        let rec =
            RequestValidator::record_from_body(orders, json!({"estimatedDeliveryTime": "2024-05-01T12:30:00"})).unwrap();
        assert_eq!(rec["estimated_delivery_time"], json!("2024-05-01T12:30:00"));
    }

    #[test]
    fn applies_rules() {
        let m = model();
        let users = m.entity("users").unwrap();
        let rec = RequestValidator::record_from_body(users, json!({"name": "Ada", "email": "ada.x.com"})).unwrap();
        assert_eq!(err_message(RequestValidator::validate(users, &rec)), "email must be a valid email");

        let rec = RequestValidator::record_from_body(users, json!({"contactPhone": "call me"})).unwrap();
        assert!(RequestValidator::validate_partial(users, &rec).is_err());

        let items = m.entity("order_menu_item").unwrap();
        let rec = RequestValidator::record_from_body(items, json!({"quantity": -1})).unwrap();
        assert_eq!(
            err_message(RequestValidator::validate_partial(items, &rec)),
            "quantity must be at least 0"
        );
    }

    #[test]
    fn allowed_values() {
        let rule = ValidationRule {
            allowed: Some(vec![json!(1), json!(2)]),
            ..Default::default()
        };
        validate_field("level", &json!(2.0), &rule, None).unwrap();
        assert!(validate_field("level", &json!(3), &rule, None).is_err());
    }
}
