//! Offline migration tool: creates the database if needed and applies the food-delivery schema.

use food_api::{apply_migrations, food_delivery, resolve, store, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("food_api=info")))
        .init();

    let settings = Settings::from_env()?;
    let model = resolve(&food_delivery(&settings.db_schema))?;

    tracing::info!("migration started");
    store::ensure_database_exists(&settings.database_url).await?;
    let pool = store::connect(&settings).await?;
    let result = apply_migrations(&pool, &model).await;
    store::close(pool).await;
    result?;
    tracing::info!("migration finished");
    Ok(())
}
