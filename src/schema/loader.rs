//! Build the runtime model (and its relationship graph) from a schema declaration.

use crate::case::to_camel_case;
use crate::error::SchemaError;
use crate::schema::resolved::{ColumnInfo, ForeignKey, IncludeDirection, IncludeSpec, ResolvedEntity, ResolvedModel};
use crate::schema::{validate, RelationshipConfig, SchemaConfig, TableConfig};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Validate `config` and resolve every table into an entity.
pub fn resolve(config: &SchemaConfig) -> Result<ResolvedModel, SchemaError> {
    validate(config)?;

    let api_by_table: HashMap<&str, _> = config.api_entities.iter().map(|a| (a.table.as_str(), a)).collect();

    let mut entities = HashMap::new();
    let mut table_by_path = HashMap::new();

    for table in &config.tables {
        let columns = table
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                api_name: to_camel_case(&c.name),
                column_type: c.type_,
                nullable: c.nullable,
                is_pk: c.name == table.primary_key,
                default: c.default,
            })
            .collect();

        let references = config
            .relationships
            .iter()
            .filter(|r| r.from_table == table.name)
            .map(|r| ForeignKey {
                column: r.from_column.clone(),
                parent_table: r.to_table.clone(),
                parent_column: r.to_column.clone(),
                on_delete: r.on_delete,
            })
            .collect();

        let api = api_by_table.get(table.name.as_str());
        if let Some(api) = api {
            table_by_path.insert(api.path_segment.clone(), table.name.clone());
        }

        let entity = ResolvedEntity {
            schema_name: config.schema_name.clone(),
            table_name: table.name.clone(),
            label: table.label.clone(),
            path_segment: api.map(|a| a.path_segment.clone()),
            pk_column: table.primary_key.clone(),
            columns,
            operations: api.map(|a| a.operations.iter().copied().collect()).unwrap_or_default(),
            sensitive_columns: api
                .map(|a| a.sensitive_columns.iter().cloned().collect())
                .unwrap_or_else(HashSet::new),
            references,
            includes: build_includes_for_table(&table.name, &config.relationships),
            validation: table.validation.clone(),
            patterns: compile_patterns(table)?,
        };
        entities.insert(table.name.clone(), entity);
    }

    tracing::debug!(entities = entities.len(), exposed = table_by_path.len(), "schema resolved");
    Ok(ResolvedModel {
        schema_name: config.schema_name.clone(),
        entities,
        table_by_path,
    })
}

fn compile_patterns(table: &TableConfig) -> Result<HashMap<String, Regex>, SchemaError> {
    let mut patterns = HashMap::new();
    for (col, rule) in &table.validation {
        let Some(pattern) = &rule.pattern else { continue };
        let re = Regex::new(pattern)
            .map_err(|e| SchemaError::Validation(format!("invalid pattern for {}.{}: {}", table.name, col, e)))?;
        patterns.insert(col.clone(), re);
    }
    Ok(patterns)
}

fn build_includes_for_table(table: &str, relationships: &[RelationshipConfig]) -> Vec<IncludeSpec> {
    let mut includes = Vec::new();
    for rel in relationships {
        if rel.from_table == table {
            includes.push(IncludeSpec {
                name: rel.to_one_name.clone(),
                direction: IncludeDirection::ToOne,
                related_table: rel.to_table.clone(),
                our_key_column: rel.from_column.clone(),
                their_key_column: rel.to_column.clone(),
            });
        }
        if rel.to_table == table {
            includes.push(IncludeSpec {
                name: rel.to_many_name.clone(),
                direction: IncludeDirection::ToMany,
                related_table: rel.from_table.clone(),
                our_key_column: rel.to_column.clone(),
                their_key_column: rel.from_column.clone(),
            });
        }
    }
    includes
}
