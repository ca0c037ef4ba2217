//! Video composition worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qreel_queue::JobQueue;
use qreel_worker::{
    ComposeVideoHandler, HandlerRegistry, JobExecutor, ProcessingContext, WorkerConfig,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("qreel=info".parse().unwrap())
        .add_directive("sqlx=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting qreel-worker");

    // Expose worker metrics
    if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new().install() {
        error!("Failed to install metrics exporter: {}", e);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    // The store connection is the only fatal startup dependency.
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            error!("DATABASE_URL not set");
            std::process::exit(1);
        }
    };

    let pool = match qreel_db::connect_and_migrate(&database_url, 5).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = match ProcessingContext::new(config.clone(), pool.clone()) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Failed to create processing context: {}", e);
            std::process::exit(1);
        }
    };

    let queue = JobQueue::new(pool);

    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(ComposeVideoHandler::new(Arc::clone(&ctx))));

    let executor = Arc::new(JobExecutor::new(config, queue, registry, ctx));

    // Stop the loop on ctrl-c
    let shutdown_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_executor.shutdown();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
