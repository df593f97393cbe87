//! Declarative schema types: tables, columns, foreign keys and HTTP exposure.

use std::collections::HashMap;

/// Column storage types used by the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Serial,
    Integer,
    Varchar,
    Boolean,
    Timestamp,
}

impl ColumnType {
    /// Type name used in DDL.
    pub fn ddl(self) -> &'static str {
        match self {
            ColumnType::Serial => "SERIAL",
            ColumnType::Integer => "INTEGER",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Type used to cast bound parameters (`$1::integer`).
    pub fn cast(self) -> &'static str {
        match self {
            ColumnType::Serial | ColumnType::Integer => "integer",
            ColumnType::Varchar => "varchar",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnDefault {
    Now,
}

#[derive(Clone, Debug)]
pub struct ColumnConfig {
    pub name: String,
    pub type_: ColumnType,
    pub nullable: bool,
    pub default: Option<ColumnDefault>,
}

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnDelete {
    #[default]
    Restrict,
    Cascade,
    SetNull,
}

impl OnDelete {
    pub fn sql(self) -> &'static str {
        match self {
            OnDelete::Restrict => "RESTRICT",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: Option<bool>,
    pub format: Option<String>,
    pub max_length: Option<u32>,
    pub min_length: Option<u32>,
    pub pattern: Option<String>,
    pub allowed: Option<Vec<serde_json::Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct TableConfig {
    pub name: String,
    /// Singular display name used in messages ("User not found").
    pub label: String,
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
    pub validation: HashMap<String, ValidationRule>,
}

/// A foreign key `from_table.from_column -> to_table.to_column`, plus the
/// names under which each side sees the other in joined reads.
#[derive(Clone, Debug)]
pub struct RelationshipConfig {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub on_delete: OnDelete,
    /// Include name on the referencing side (e.g. `deliveryAddress`).
    pub to_one_name: String,
    /// Include name on the referenced side (e.g. `orders`).
    pub to_many_name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiEntityConfig {
    pub table: String,
    pub path_segment: String,
    pub operations: Vec<Operation>,
    /// Columns that are written but never returned (password hashes, codes).
    pub sensitive_columns: Vec<String>,
}

/// The whole declared model.
#[derive(Clone, Debug, Default)]
pub struct SchemaConfig {
    pub schema_name: String,
    pub tables: Vec<TableConfig>,
    pub relationships: Vec<RelationshipConfig>,
    pub api_entities: Vec<ApiEntityConfig>,
}
