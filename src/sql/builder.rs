//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved entity.
//! Identifiers only ever come from the schema declaration; values are always bound.

use crate::schema::{IncludeDirection, ResolvedEntity};
use serde_json::Value;
use std::collections::BTreeMap;

/// Column name -> value, already mapped from wire keys.
pub type Record = BTreeMap<String, Value>;

/// One include for a joined read: name, direction, related entity, our key column, their key column.
#[derive(Debug)]
pub struct IncludeSelect<'a> {
    pub name: &'a str,
    pub direction: IncludeDirection,
    pub related: &'a ResolvedEntity,
    pub our_key: &'a str,
    pub their_key: &'a str,
}

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub(crate) fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Push a value and return its cast placeholder, e.g. `$2::integer`.
    fn push_param(&mut self, v: Value, cast: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), cast)
    }
}

/// Visible columns of `entity`, optionally prefixed with a table alias.
fn select_column_list(entity: &ResolvedEntity, alias: Option<&str>) -> String {
    entity
        .visible_columns()
        .map(|c| match alias {
            Some(a) => format!("{}.{} AS {}", a, quoted(&c.name), quoted(&c.name)),
            None => quoted(&c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn pk_placeholder(q: &mut QueryBuf, entity: &ResolvedEntity, id: i64) -> String {
    let cast = entity
        .column(&entity.pk_column)
        .map(|c| c.column_type.cast())
        .unwrap_or("integer");
    q.push_param(Value::from(id), cast)
}

/// Scalar subquery per include: `row_to_json` for to_one, `json_agg` for to_many.
fn include_subquery(inc: &IncludeSelect<'_>) -> String {
    let rel_cols = select_column_list(inc.related, None);
    let from = format!(
        "{} WHERE {} = {}.{}",
        qualified_table(inc.related),
        quoted(inc.their_key),
        MAIN_ALIAS,
        quoted(inc.our_key)
    );
    let sub = match inc.direction {
        IncludeDirection::ToOne => format!("(SELECT row_to_json(sub) FROM (SELECT {} FROM {}) sub)", rel_cols, from),
        IncludeDirection::ToMany => format!(
            "(SELECT COALESCE(json_agg(row_to_json(sub) ORDER BY sub.{}), '[]'::json) FROM (SELECT {} FROM {}) sub)",
            quoted(&inc.related.pk_column),
            rel_cols,
            from
        ),
    };
    format!("{} AS {}", sub, quoted(inc.name))
}

fn select(entity: &ResolvedEntity, id: Option<i64>, includes: &[IncludeSelect<'_>]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut parts = vec![select_column_list(entity, Some(MAIN_ALIAS))];
    parts.extend(includes.iter().map(include_subquery));
    let pk = format!("{}.{}", MAIN_ALIAS, quoted(&entity.pk_column));
    let tail = match id {
        Some(id) => format!(" WHERE {} = {}", pk, pk_placeholder(&mut q, entity, id)),
        None => format!(" ORDER BY {}", pk),
    };
    q.sql = format!(
        "SELECT {} FROM {} {}{}",
        parts.join(", "),
        qualified_table(entity),
        MAIN_ALIAS,
        tail
    );
    q
}

/// SELECT every row ordered by primary key, with optional includes.
pub fn select_list(entity: &ResolvedEntity, includes: &[IncludeSelect<'_>]) -> QueryBuf {
    select(entity, None, includes)
}

/// SELECT one row by primary key, with optional includes.
pub fn select_by_id(entity: &ResolvedEntity, id: i64, includes: &[IncludeSelect<'_>]) -> QueryBuf {
    select(entity, Some(id), includes)
}

/// `SELECT EXISTS(...)` probe for a referenced row.
pub fn exists_by_column(entity: &ResolvedEntity, column: &str, value: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cast = entity.column(column).map(|c| c.column_type.cast()).unwrap_or("integer");
    let ph = q.push_param(value, cast);
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {})",
        qualified_table(entity),
        quoted(column),
        ph
    );
    q
}

/// INSERT the given columns; the primary key and omitted defaulted columns are left to the store.
pub fn insert(entity: &ResolvedEntity, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        if c.is_pk {
            continue;
        }
        let Some(val) = body.get(&c.name) else { continue };
        placeholders.push(q.push_param(val.clone(), c.column_type.cast()));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(entity, None);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", qualified_table(entity), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            qualified_table(entity),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// Single-statement UPDATE by id: `RETURNING` yields no row when the id does not exist.
/// `updated_at` is refreshed when the table has one. The primary key is never written.
pub fn update(entity: &ResolvedEntity, id: i64, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.is_pk {
            continue;
        }
        let Some(val) = body.get(&c.name) else { continue };
        let ph = q.push_param(val.clone(), c.column_type.cast());
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if entity.has_column("updated_at") && !body.contains_key("updated_at") {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let returning = select_column_list(entity, None);
    if sets.is_empty() {
        // Nothing to write: still report whether the row exists.
        let ph = pk_placeholder(&mut q, entity, id);
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            returning,
            qualified_table(entity),
            quoted(&entity.pk_column),
            ph
        );
        return q;
    }
    let ph = pk_placeholder(&mut q, entity, id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        sets.join(", "),
        quoted(&entity.pk_column),
        ph,
        returning
    );
    q
}

/// Single-statement DELETE by id.
pub fn delete(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = pk_placeholder(&mut q, entity, id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(entity),
        quoted(&entity.pk_column),
        ph,
        quoted(&entity.pk_column)
    );
    q
}
