// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use rust_health_checker::{
    broker::BrokerClient,
    cache::Cache,
    config,
    health::{HealthAggregator, Pingable},
    metrics::MetricsRegistry,
    server::{RequestHandler, ServerBuilder},
    store::Store,
};

const COMPONENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rust_health_checker=debug".parse()?)
                .add_directive("lapin=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path)?;

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    // Construct each configured dependency explicitly; this is the single
    // initialization point, and the shutdown block below is the single
    // teardown point.
    let store = match &config.store {
        Some(store_config) => Some(Arc::new(Store::connect(store_config).await?)),
        None => None,
    };

    let cache = match &config.cache {
        Some(cache_config) => Some(Arc::new(Cache::connect(cache_config).await?)),
        None => None,
    };

    let broker = match &config.broker {
        Some(broker_config) => {
            let client = Arc::new(
                BrokerClient::new(broker_config.retry_interval()).with_metrics(metrics.clone()),
            );
            client.connect(broker_config.params()).await?;
            Some(client)
        }
        None => None,
    };

    // Register probes in their fixed report order: store, cache, broker.
    let mut aggregator =
        HealthAggregator::new(config.health.probe_timeout()).with_metrics(metrics);
    aggregator.register(
        "postgres",
        COMPONENT_VERSION,
        store.clone().map(|s| s as Arc<dyn Pingable>),
    );
    aggregator.register(
        "redis",
        COMPONENT_VERSION,
        cache.clone().map(|c| c as Arc<dyn Pingable>),
    );
    aggregator.register(
        "rabbitmq",
        COMPONENT_VERSION,
        broker.clone().map(|b| b as Arc<dyn Pingable>),
    );

    let handler = RequestHandler::new(
        Arc::new(aggregator),
        metrics_registry,
        config.metrics.clone(),
    );

    let addr: SocketAddr = config.server.listen_addr.parse()?;
    info!("Starting health checker on {}", addr);

    let server = ServerBuilder::new(addr).with_handler(handler).serve();

    tokio::select! {
        result = server => {
            if let Err(err) = result {
                error!(%err, "server error");
            }
        }
        _ = shutdown_signal() => {}
    }

    // Graceful teardown: close every collaborator exactly once.
    if let Some(broker) = broker {
        if let Err(err) = broker.close().await {
            error!(%err, "broker close failed");
        }
    }
    if let Some(store) = store {
        store.close().await;
    }
    if let Some(cache) = cache {
        cache.close();
    }

    info!("Shutdown complete");
    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
