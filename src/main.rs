//! Prowl relay - HTTP-triggered push notifications
//!
//! Listens for `/<application>/<event>/<description>` requests and forwards
//! them to Prowl outside configured quiet hours.

use anyhow::Result;
use clap::Parser;
use prowl_relay::{
    cli::Cli,
    config::Config,
    dispatch::Dispatcher,
    internal_metrics::MetricsBuilder,
    server::RelayServer,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Manually initialize logging for this specific error
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Prowl relay starting up...");

    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Host: {}", config.host);
    info!("Port: {}", config.port);
    info!(
        "Prowl Token: {}",
        if config.token.is_empty() { "Not set" } else { "<redacted>" }
    );
    info!("Prowl URL: {}", config.prowl_url);
    info!("Request Timeout: {}s", config.request_timeout_seconds);
    info!("Mirror URL: {}", config.mirror_url().unwrap_or("Disabled"));
    for period in &config.ignore {
        info!("Quiet Hours: {:04} - {:04}", period.from, period.to);
    }
    info!(
        "Metrics: {}",
        if config.metrics.enabled {
            config.metrics.listen_address.to_string()
        } else {
            "Disabled".to_string()
        }
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let (metrics, metrics_server) = MetricsBuilder::new(config.metrics.clone()).build(shutdown_rx.clone());
    let metrics_task = metrics_server.map(|(server, addr)| {
        info!("Metrics server listening on {}", addr);
        tokio::spawn(server.run())
    });

    let config = Arc::new(config);
    let dispatcher = Arc::new(Dispatcher::builder(config.clone()).metrics(metrics).build()?);

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let server_task = tokio::spawn(RelayServer::new(listener, dispatcher, shutdown_rx.clone()).run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");

    if shutdown_tx.send(()).is_err() {
        error!("Failed to send shutdown signal");
    }

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Relay server failed: {}", e),
        Err(e) => error!("Relay server task panicked: {:?}", e),
    }

    if let Some(handle) = metrics_task {
        if let Err(e) = handle.await {
            error!("Metrics task panicked: {:?}", e);
        }
    }

    info!("All tasks shut down. Exiting.");

    Ok(())
}
