use tokio::net::TcpListener;
use tokio::sync::watch;

use kafka_observatory::config::AppConfig;
use kafka_observatory::server::{init_tracing, Application, LogBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let backend = LogBackend::from_config(&config.kafka)?;
    let app = Application::new(&config, backend)?;
    app.bootstrap_topics().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = app.spawn_sweeper(shutdown_rx);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        "Kafka Observatory listening"
    );

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::warn!("Idle sweeper task ended abnormally: {}", e);
    }
    let stopped = app.sessions.stop_all();
    tracing::info!(stopped, "Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
