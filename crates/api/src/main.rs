use std::net::SocketAddr;

use anyhow::Context;

use bazaar_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaar_observability::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let (app, services) = bazaar_api::app::build_app(&config).await?;

    let worker = config
        .export_poll_interval
        .map(|interval| services.export_worker.clone().spawn(interval));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(worker) = worker {
        worker.shutdown().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
