//! Resolved entity model: schema validated and flattened for runtime use.

use crate::schema::{ColumnDefault, ColumnType, OnDelete, Operation, ValidationRule};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Direction of a related include: to_one (we hold the FK) or to_many (they hold an FK to us).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeDirection {
    ToOne,
    ToMany,
}

/// One edge of the relationship graph as seen from a single entity.
#[derive(Clone, Debug)]
pub struct IncludeSpec {
    /// API name for the include, e.g. `addresses` or `deliveryAddress`.
    pub name: String,
    pub direction: IncludeDirection,
    pub related_table: String,
    /// Our column used in the join (our FK for to_one; our PK for to_many).
    pub our_key_column: String,
    /// Their column used in the join (their PK for to_one; their FK for to_many).
    pub their_key_column: String,
}

/// An outgoing foreign key.
#[derive(Clone, Debug)]
pub struct ForeignKey {
    pub column: String,
    pub parent_table: String,
    pub parent_column: String,
    pub on_delete: OnDelete,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    /// camelCase key on the wire.
    pub api_name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub is_pk: bool,
    pub default: Option<ColumnDefault>,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub schema_name: String,
    pub table_name: String,
    pub label: String,
    /// Set when the entity is served over HTTP.
    pub path_segment: Option<String>,
    pub pk_column: String,
    pub columns: Vec<ColumnInfo>,
    pub operations: HashSet<Operation>,
    pub sensitive_columns: HashSet<String>,
    pub references: Vec<ForeignKey>,
    pub includes: Vec<IncludeSpec>,
    pub validation: HashMap<String, ValidationRule>,
    /// Compiled `pattern` rules, keyed by column.
    pub patterns: HashMap<String, Regex>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Match a request key against the wire name or the raw column name.
    pub fn column_for_key(&self, key: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.api_name == key || c.name == key)
    }

    /// Columns that may appear in responses.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| !self.sensitive_columns.contains(&c.name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn include(&self, name: &str) -> Option<&IncludeSpec> {
        self.includes.iter().find(|i| i.name == name)
    }

    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub schema_name: String,
    pub entities: HashMap<String, ResolvedEntity>,
    pub table_by_path: HashMap<String, String>,
}

impl ResolvedModel {
    pub fn entity(&self, table: &str) -> Option<&ResolvedEntity> {
        self.entities.get(table)
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&ResolvedEntity> {
        self.table_by_path.get(path).and_then(|t| self.entities.get(t))
    }
}
