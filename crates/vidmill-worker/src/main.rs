//! Pipeline worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vidmill_media::{check_ffmpeg, check_ffprobe};
use vidmill_queue::QueueTransport;
use vidmill_worker::{Executor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vidmill=info".parse().expect("valid directive"));

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

    info!("Starting vidmill-worker");

    // FFmpeg is required by the composite stage; fail before consuming
    if let Err(e) = check_ffmpeg() {
        error!("FFmpeg not available: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = check_ffprobe() {
        error!("ffprobe not available: {}", e);
        std::process::exit(1);
    }

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let transport = match QueueTransport::from_env() {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("Failed to create queue transport: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = transport.check_connection().await {
        error!(
            broker = %transport.config().masked_redis_url(),
            "Broker unreachable: {}", e
        );
        std::process::exit(1);
    }
    info!(broker = %transport.config().masked_redis_url(), "Broker connected");

    let executor = match Executor::new(config, transport) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            error!("Failed to create executor: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl-C triggers a graceful drain
    let shutdown_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            shutdown_executor.shutdown();
        }
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
