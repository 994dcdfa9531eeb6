//! Strata Gateway
//!
//! Binary entry point: loads configuration, wires the driver/job-queue/
//! postal-service adapters and the three lifecycle services, and serves
//! the API façade.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use strata_gateway::adapters::{InMemoryJobQueue, InMemoryPostalService, MockDriver};
use strata_gateway::config::Config;
use strata_gateway::services::{InfrastructureMessagingService, InfrastructureService, InfrastructureTaskMonitoringService};
use strata_gateway::state::AppState;
use strata_gateway::{build_router, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("failed to load .env file: {err}");
        }
    }

    init_tracing();

    info!("starting strata-gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "failed to load configuration, falling back to defaults");
        Config::default()
    });
    info!(environment = %config.environment, "configuration loaded");

    let job_queue: Arc<dyn strata_core::JobQueue> = Arc::new(InMemoryJobQueue::new());
    let postal_service: Arc<dyn strata_core::PostalService> = Arc::new(InMemoryPostalService::default());
    // No concrete provisioning backend is mandated by this framework; a real
    // deployment substitutes its own `Driver` implementation here.
    let driver: Arc<dyn strata_core::Driver> = Arc::new(MockDriver::new());

    let messaging_service = InfrastructureMessagingService::new(
        Some(postal_service.clone()),
        Some(config.infrastructure.topics.clone()),
    )
    .expect("messaging service misconfigured");
    let messaging_service = Arc::new(messaging_service);

    let monitor_service = if config.infrastructure.async_messaging_enabled {
        Some(
            InfrastructureTaskMonitoringService::new(Some(job_queue.clone()), Some(messaging_service.clone()), Some(driver.clone()))
                .await
                .expect("task monitoring service misconfigured"),
        )
    } else {
        None
    };

    let infrastructure_service = Arc::new(
        InfrastructureService::new(Some(driver), Some(config.infrastructure.clone()), monitor_service, None)
            .expect("infrastructure service misconfigured"),
    );

    let state = AppState::new(config.clone(), infrastructure_service);
    let app = build_router(state);

    let addr: SocketAddr = config.server.address().parse().expect("invalid server address");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(address = %addr, "strata-gateway listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("strata-gateway shutdown complete");
    Ok(())
}

/// `LOG_LEVEL`/`LOG_TYPE` are read directly from the process environment,
/// not through the layered `Config` loader — selecting the Logstash
/// formatter or the default compact one before any configuration file has
/// even been read.
fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let log_type = std::env::var("LOG_TYPE").unwrap_or_else(|_| "flat".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_lowercase()));

    if log_type.eq_ignore_ascii_case("logstash") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .event_format(strata_core::logstash::LogstashFormatter::new("strata-gateway"))
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
