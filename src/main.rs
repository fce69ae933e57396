use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use event_router::{create_router, open_store, AppConfig, AppState, Dispatcher, WebhookClient};

#[derive(Parser)]
#[command(name = "event-router")]
#[command(about = "Relay event alerts to Teams and PagerDuty webhooks")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Port to listen on (overrides config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("🚀 Starting event-router");

    let mut config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load application config {:?}", args.config))?;
    config.apply_env()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!("✅ Loaded configuration from {:?}", args.config);

    // No usable store means no serving.
    let store = open_store(&config)
        .await
        .context("Unable to initialize the route store")?;

    let client = WebhookClient::new(Duration::from_secs(config.delivery.timeout_secs))?;
    let dispatcher = Dispatcher::new(client, config.delivery.pagerduty_events_url.clone());

    let app = create_router(AppState {
        store: store.clone(),
        dispatcher,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Unable to bind {}", addr))?;
    info!("🌐 event-router listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    info!("Shut down event-router");

    served.context("HTTP server failed")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Caught SIGINT, shutting down"),
        _ = terminate => info!("Caught SIGTERM, shutting down"),
    }
}
