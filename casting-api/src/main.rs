use std::sync::Arc;
use std::time::Duration;

use castguard::jwt::{Audience, ClaimsValidator, Issuer};
use castguard::Authority;
use castguard_axum::RequestGuard;
use casting_api::config::Config;
use casting_api::store::Store;
use casting_api::{router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("config.toml"));
    let config = Config::load(&config_path)?;

    let validator = ClaimsValidator::new(
        Issuer::new(config.auth.issuer.clone()),
        Audience::new(config.auth.audience.clone()),
    )
    .with_leeway(config.auth.leeway_secs);

    let authority = Authority::new_from_url(config.auth.jwks_url.clone(), validator).await?;
    // The refresh task runs for the life of the process.
    let _refresh = authority.spawn_refresh(Duration::from_secs(config.auth.refresh_interval_secs));

    let state = AppState {
        store: Arc::new(Store::seeded()),
        guard: RequestGuard::new(authority),
        page_limit: config.pagination.page_limit,
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "casting agency API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "unable to listen for shutdown signal");
    }
}
