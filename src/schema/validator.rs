//! Schema validation: referential integrity of the declarations themselves.

use crate::error::SchemaError;
use crate::schema::SchemaConfig;
use std::collections::{HashMap, HashSet};

pub fn validate(config: &SchemaConfig) -> Result<(), SchemaError> {
    if config.schema_name.is_empty() {
        return Err(SchemaError::Validation("schema name must not be empty".into()));
    }

    let mut table_columns: HashMap<&str, HashSet<&str>> = HashMap::new();
    for t in &config.tables {
        let cols: HashSet<&str> = t.columns.iter().map(|c| c.name.as_str()).collect();
        if cols.len() != t.columns.len() {
            return Err(SchemaError::Validation(format!("duplicate column in table {}", t.name)));
        }
        if !cols.contains(t.primary_key.as_str()) {
            return Err(SchemaError::InvalidPrimaryKey {
                table: t.name.clone(),
                column: t.primary_key.clone(),
            });
        }
        for col in t.validation.keys() {
            if !cols.contains(col.as_str()) {
                return Err(SchemaError::MissingReference {
                    kind: "validated column",
                    id: format!("{}.{}", t.name, col),
                });
            }
        }
        if table_columns.insert(t.name.as_str(), cols).is_some() {
            return Err(SchemaError::DuplicateTable(t.name.clone()));
        }
    }

    let pk_of: HashMap<&str, &str> = config
        .tables
        .iter()
        .map(|t| (t.name.as_str(), t.primary_key.as_str()))
        .collect();
    for r in &config.relationships {
        let id = format!("{}.{} -> {}.{}", r.from_table, r.from_column, r.to_table, r.to_column);
        let from_ok = table_columns
            .get(r.from_table.as_str())
            .is_some_and(|c| c.contains(r.from_column.as_str()));
        let to_is_pk = pk_of.get(r.to_table.as_str()) == Some(&r.to_column.as_str());
        if !from_ok || !to_is_pk {
            return Err(SchemaError::MissingReference { kind: "relationship", id });
        }
    }

    // Include names share one namespace per table: to_one names on the
    // referencing table, to_many names on the referenced one.
    let mut include_names: HashSet<(&str, &str)> = HashSet::new();
    for r in &config.relationships {
        for (table, name) in [
            (r.from_table.as_str(), r.to_one_name.as_str()),
            (r.to_table.as_str(), r.to_many_name.as_str()),
        ] {
            if !include_names.insert((table, name)) {
                return Err(SchemaError::DuplicateInclude {
                    table: table.to_string(),
                    name: name.to_string(),
                });
            }
        }
    }

    let mut path_segments = HashSet::new();
    for api in &config.api_entities {
        let Some(cols) = table_columns.get(api.table.as_str()) else {
            return Err(SchemaError::MissingReference {
                kind: "table",
                id: api.table.clone(),
            });
        };
        if !path_segments.insert(api.path_segment.as_str()) {
            return Err(SchemaError::DuplicatePathSegment(api.path_segment.clone()));
        }
        for s in &api.sensitive_columns {
            if !cols.contains(s.as_str()) {
                return Err(SchemaError::MissingReference {
                    kind: "sensitive column",
                    id: format!("{}.{}", api.table, s),
                });
            }
        }
    }

    Ok(())
}
