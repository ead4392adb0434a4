use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytdl_core::{
    load_config_or_default, validate_config, BatchScheduler, FfmpegTranscoder, Fetcher,
    PlatformRegistry, Transcoder, YtDlpFetcher,
};
use ytdl_server::{api::create_router, metrics, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("YTDL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    if config_path.exists() {
        info!("Loading configuration from {:?}", config_path);
    } else {
        warn!("No config file at {:?}, using defaults", config_path);
    }
    let config = load_config_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Download directory: {:?}", config.downloads.directory);
    info!("Concurrency: {}", config.scheduler.concurrency);

    // External tools
    let fetcher = YtDlpFetcher::new(config.fetcher.clone())
        .with_subtitles(config.downloads.subtitle_options())
        .with_audio_quality(config.downloads.audio_quality.clone());
    if let Err(e) = fetcher.validate().await {
        warn!("Fetcher not ready, downloads will fail: {}", e);
    }

    let transcoder = FfmpegTranscoder::new(config.transcoder.clone());
    if let Err(e) = transcoder.validate().await {
        warn!("Transcoder not ready, conversions will fail: {}", e);
    }

    let registry = Arc::new(PlatformRegistry::builtin());
    info!("Platform registry loaded with {} platforms", registry.len());

    let scheduler = Arc::new(BatchScheduler::new(
        config.scheduler.clone(),
        registry.clone(),
        Arc::new(fetcher),
        Arc::new(transcoder),
    ));
    let metrics_task = metrics::spawn_event_recorder(&scheduler);

    if config.scheduler.autostart {
        scheduler.start().await;
    } else {
        info!("Autostart disabled, scheduler waits for POST /scheduler/start");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&scheduler),
        registry,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down, stopping scheduler...");
    scheduler.stop().await;
    metrics_task.abort();
    info!("Scheduler stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
