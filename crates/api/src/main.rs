use anyhow::Context;
use tracing::info;

use fleetguard_infra::IngestConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fleetguard_observability::init();

    let config = IngestConfig::from_env().context("loading configuration")?;
    let services = fleetguard_api::app::services::build_services(&config).await?;
    let app = fleetguard_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %listener.local_addr()?,
        region = %config.region,
        policy = %config.failure_policy,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}
