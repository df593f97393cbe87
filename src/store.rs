//! Connection pool lifecycle and database bootstrap.

use crate::error::AppError;
use crate::settings::Settings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Open the bounded pool shared by all requests. Connects eagerly so a bad URL fails at startup.
pub async fn connect(settings: &Settings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(settings.db_acquire_timeout)
        .connect(&settings.database_url)
        .await?;
    tracing::info!(max_connections = settings.db_max_connections, "database pool ready");
    Ok(pool)
}

/// Wait for checked-out connections to be returned, then close the pool.
pub async fn close(pool: PgPool) {
    tracing::info!(in_use = pool.size().saturating_sub(pool.num_idle() as u32), "draining database pool");
    pool.close().await;
    tracing::info!("database pool closed");
}

/// Create the target database if it does not exist (connects to the `postgres` maintenance database).
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn = opts.connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split `postgres://host/db?opts` into (`postgres://host/postgres?opts`, `db`).
fn split_database_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no database path".into()))?;
    let (path, query) = match url[path_start..].split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (&url[path_start..], None),
    };
    let mut admin_url = format!("{}postgres", &url[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, path.trim().to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name() {
        let (admin, db) = split_database_url("postgres://u:p@localhost:5432/food").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(db, "food");
    }

    #[test]
    fn keeps_connection_options() {
        let (admin, db) = split_database_url("postgres://localhost/food?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://localhost/postgres?sslmode=disable");
        assert_eq!(db, "food");
    }

    #[test]
    fn requires_a_path() {
        assert!(split_database_url("postgres://localhost").is_err());
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("food\"db"), "\"food\"\"db\"");
    }
}
