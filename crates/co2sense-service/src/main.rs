//! CO2sense Service - Reading ingest and query HTTP API.
//!
//! Run with: `cargo run -p co2sense-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use co2sense_service::{AppState, Config, api};
use co2sense_store::Registry;
use co2sense_types::DeviceId;

/// CO2sense Service - Reading ingest and query HTTP API.
#[derive(Parser, Debug)]
#[command(name = "co2sense-service")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Data directory holding one store per device (overrides config).
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground (default behavior).
    Run,

    /// Create a store for a new device and print its identifier.
    Provision,

    /// Delete a device and all of its readings.
    Deprovision {
        /// Device identifier.
        id: DeviceId,
    },

    /// List the devices found in the data directory.
    Devices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("co2sense_service=info".parse()?)
                .add_directive("co2sense_store=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = load_config(&args)?;
    let registry = Arc::new(Registry::with_policy(
        &config.storage.path,
        config.sampling.downsample(),
    ));

    match args.command {
        Some(Command::Provision) => provision(&registry),
        Some(Command::Deprovision { id }) => deprovision(&registry, &id),
        Some(Command::Devices) => list_devices(&registry),
        Some(Command::Run) | None => run_server(registry, config).await,
    }
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring unreadable default config: {}", e);
            Config::default()
        }),
    };

    // Override config with CLI args
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        config.storage.path = data_dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn provision(registry: &Registry) -> anyhow::Result<()> {
    let id = DeviceId::new_v4();
    registry
        .create(&id)
        .with_context(|| format!("Failed to provision device {}", id))?;
    registry.shutdown()?;
    println!("{}", id);
    Ok(())
}

fn deprovision(registry: &Registry, id: &DeviceId) -> anyhow::Result<()> {
    registry
        .remove(id)
        .with_context(|| format!("Failed to deprovision device {}", id))?;
    println!("Deleted device {}", id);
    Ok(())
}

fn list_devices(registry: &Registry) -> anyhow::Result<()> {
    registry.open_all()?;
    for id in registry.devices() {
        let count = registry.handle(&id)?.count()?;
        println!("{}  {} reading(s)", id, count);
    }
    registry.shutdown()?;
    Ok(())
}

async fn run_server(registry: Arc<Registry>, config: Config) -> anyhow::Result<()> {
    info!("Opening device stores in {:?}", config.storage.path);
    let report = registry
        .open_all()
        .with_context(|| format!("Cannot read data directory {:?}", config.storage.path))?;
    if report.has_warnings() {
        warn!(
            "{} entr{} in the data directory were not opened",
            report.skipped.len(),
            if report.skipped.len() == 1 { "y" } else { "ies" }
        );
    }

    let addr: SocketAddr = config.server.bind.parse()?;
    let state = AppState::new(Arc::clone(&registry), config);

    #[cfg(feature = "mqtt")]
    let mqtt_task = co2sense_service::mqtt::MqttPublisher::new(Arc::clone(&state)).start();

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::clone(&state));

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
        .await?;

    #[cfg(feature = "mqtt")]
    {
        if let Some(task) = mqtt_task
            && let Err(e) = task.await
        {
            warn!("MQTT publisher ended abnormally: {}", e);
        }
    }

    registry.shutdown()?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
    state.signal_shutdown();
}
