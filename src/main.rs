//! Server: loads settings, opens the pool, resolves the model and serves until SIGINT/SIGTERM.

use food_api::{app, food_delivery, resolve, store, AppState, RequestLimits, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("food_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let model = resolve(&food_delivery(&settings.db_schema))?;
    let pool = store::connect(&settings).await?;
    let state = AppState::new(pool.clone(), model);

    let listener = TcpListener::bind(settings.socket_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, RequestLimits::from(&settings)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store::close(pool).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
