//! Apply the resolved model to the database: schema, tables in foreign-key order,
//! foreign keys with their declared ON DELETE policy, and an index per foreign key.
//! Idempotent: every statement is IF NOT EXISTS.

use crate::error::{AppError, SchemaError};
use crate::schema::{ColumnDefault, ResolvedEntity, ResolvedModel};
use sqlx::PgPool;
use std::collections::{BTreeMap, BTreeSet};

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote(schema), quote(table))
}

/// Tables ordered so every referenced table comes before the tables that reference it.
pub fn creation_order(model: &ResolvedModel) -> Result<Vec<&ResolvedEntity>, SchemaError> {
    let mut pending: BTreeMap<&str, BTreeSet<&str>> = model
        .entities
        .values()
        .map(|e| {
            let parents = e
                .references
                .iter()
                .map(|fk| fk.parent_table.as_str())
                .filter(|p| *p != e.table_name)
                .collect();
            (e.table_name.as_str(), parents)
        })
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready: Vec<&str> = pending
            .iter()
            .filter(|(_, parents)| parents.is_empty())
            .map(|(t, _)| *t)
            .collect();
        if ready.is_empty() {
            let stuck: Vec<&str> = pending.keys().copied().collect();
            return Err(SchemaError::Validation(format!(
                "foreign key cycle between tables: {}",
                stuck.join(", ")
            )));
        }
        for t in ready {
            pending.remove(t);
            for parents in pending.values_mut() {
                parents.remove(t);
            }
            if let Some(e) = model.entity(t) {
                order.push(e);
            }
        }
    }
    Ok(order)
}

fn create_table_sql(entity: &ResolvedEntity) -> String {
    let mut defs = Vec::with_capacity(entity.columns.len());
    for c in &entity.columns {
        let mut def = format!("{} {}", quote(&c.name), c.column_type.ddl());
        if c.is_pk {
            def.push_str(" PRIMARY KEY");
        } else if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ColumnDefault::Now) = c.default {
            def.push_str(" DEFAULT NOW()");
        }
        if let Some(fk) = entity.references.iter().find(|fk| fk.column == c.name) {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE {}",
                qualified(&entity.schema_name, &fk.parent_table),
                quote(&fk.parent_column),
                fk.on_delete.sql()
            ));
        }
        defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified(&entity.schema_name, &entity.table_name),
        defs.join(",\n    ")
    )
}

/// Every DDL statement for `model`, in execution order.
pub fn migration_statements(model: &ResolvedModel) -> Result<Vec<String>, SchemaError> {
    let order = creation_order(model)?;
    let mut out = vec![format!("CREATE SCHEMA IF NOT EXISTS {}", quote(&model.schema_name))];
    out.extend(order.iter().map(|e| create_table_sql(e)));
    for e in &order {
        for fk in &e.references {
            out.push(format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote(&format!("idx_{}_{}", e.table_name, fk.column)),
                qualified(&e.schema_name, &e.table_name),
                quote(&fk.column)
            ));
        }
    }
    Ok(out)
}

/// Run all statements in one transaction.
pub async fn apply_migrations(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    let statements = migration_statements(model)?;
    let mut tx = pool.begin().await?;
    for sql in &statements {
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = statements.len(), "migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{food_delivery, resolve};

    fn position(order: &[&ResolvedEntity], table: &str) -> usize {
        order.iter().position(|e| e.table_name == table).unwrap()
    }

    #[test]
    fn parents_are_created_first() {
        let model = resolve(&food_delivery("public")).unwrap();
        let order = creation_order(&model).unwrap();
        assert_eq!(order.len(), 14);
        for e in &order {
            for fk in &e.references {
                assert!(
                    position(&order, &fk.parent_table) < position(&order, &e.table_name),
                    "{} must precede {}",
                    fk.parent_table,
                    e.table_name
                );
            }
        }
    }

    #[test]
    fn table_ddl_carries_delete_policy() {
        let model = resolve(&food_delivery("food")).unwrap();
        let statements = migration_statements(&model).unwrap();
        assert_eq!(statements[0], "CREATE SCHEMA IF NOT EXISTS \"food\"");

        let city = statements.iter().find(|s| s.contains("TABLE IF NOT EXISTS \"food\".\"city\"")).unwrap();
        assert!(city.contains("\"id\" SERIAL PRIMARY KEY"));
        assert!(city.contains("\"state_id\" INTEGER REFERENCES \"food\".\"state\" (\"id\") ON DELETE RESTRICT"));

        let items = statements
            .iter()
            .find(|s| s.contains("TABLE IF NOT EXISTS \"food\".\"order_menu_item\""))
            .unwrap();
        assert!(items.contains("\"order_id\" INTEGER REFERENCES \"food\".\"orders\" (\"id\") ON DELETE CASCADE"));

        let orders = statements.iter().find(|s| s.contains("TABLE IF NOT EXISTS \"food\".\"orders\"")).unwrap();
        assert!(orders.contains("ON DELETE SET NULL"));
        assert!(orders.contains("\"created_at\" TIMESTAMP DEFAULT NOW()"));
    }

    #[test]
    fn indexes_every_foreign_key() {
        let model = resolve(&food_delivery("public")).unwrap();
        let statements = migration_statements(&model).unwrap();
        let indexes = statements.iter().filter(|s| s.starts_with("CREATE INDEX")).count();
        assert_eq!(indexes, 19);
        assert!(statements.contains(
            &"CREATE INDEX IF NOT EXISTS \"idx_address_city_id\" ON \"public\".\"address\" (\"city_id\")".to_string()
        ));
    }

    #[test]
    fn detects_cycles() {
        let mut model = resolve(&food_delivery("public")).unwrap();
        let state = model.entities.get_mut("state").unwrap();
        state.references.push(crate::schema::ForeignKey {
            column: "code".into(),
            parent_table: "city".into(),
            parent_column: "id".into(),
            on_delete: Default::default(),
        });
        assert!(matches!(creation_order(&model), Err(SchemaError::Validation(_))));
    }
}
