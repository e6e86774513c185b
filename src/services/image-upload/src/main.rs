use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, ConfigError};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tracing::info;

use image_upload::{
    config_types::{LoggingConfig, UploadServiceConfig},
    create_router, initialize_services,
};

/// Image upload service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file, without extension
    #[arg(long, env = "IMAGE_UPLOAD_CONFIG", default_value = "config/image-upload")]
    config: PathBuf,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = load_config(&args.config).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    info!(
        "Starting Image Upload Service v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize services; this creates the upload directory
    let config = Arc::new(config);
    let app_state = initialize_services(config.clone())
        .await
        .context("Failed to initialize services")?;
    info!("All services initialized successfully");

    let app = create_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    info!("Image Upload Service starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Image Upload Service shutting down");
    Ok(())
}

/// Load configuration from an optional file and the environment
fn load_config(path: &std::path::Path) -> Result<UploadServiceConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(config::File::with_name(&path.to_string_lossy()).required(false))
        .add_source(config::Environment::with_prefix("IMAGE_UPLOAD").separator("__"))
        .build()?;

    settings.try_deserialize::<UploadServiceConfig>()
}

/// Initialize tracing, honouring `RUST_LOG` over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("image_upload={},tower_http={}", logging.level, logging.level).into()
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
