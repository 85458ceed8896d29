//! Inkpanel Daemon
//!
//! Drives an e-paper status panel and redraws it as device subsystems
//! report events.

mod config;
mod events;
mod headless;
mod rendering;
mod status;
mod worker;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use inkpanel_hw::{linux, EpdDevice, Panel};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::Config;
use headless::HeadlessPanel;
use rendering::ScreenRenderer;
use status::{StatusProbe, SystemLink};
use worker::{DisplayWorker, WorkerSettings};

/// Capacity of each event channel.
const EVENT_QUEUE: usize = 16;

#[derive(Parser)]
#[command(name = "inkpaneld")]
#[command(about = "E-paper status panel daemon")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Default log level (overridden per target by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write frames to the snapshot file instead of the panel
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(args.log_level.parse().context("Invalid log level")?),
        )
        .init();

    // Load configuration
    let config = Config::load(&args.config).context("Failed to load configuration")?;
    info!("Loaded configuration from: {:?}", args.config);

    let geometry = config.panel.geometry();
    let orientation = config.display.orientation()?;
    let settings = WorkerSettings {
        mode: config.display.refresh_mode()?,
        init_retries: config.display.init_retries,
        settle: config.display.settle(),
        status_refresh: config.display.status_refresh(),
        sleep_between_updates: config.display.sleep_between_updates,
    };

    let panel: Box<dyn Panel + Send> = if args.headless || config.display.headless {
        Box::new(HeadlessPanel::new(
            geometry.clone(),
            orientation,
            config.display.snapshot.clone(),
        ))
    } else {
        let interface = linux::open(&geometry).context("Failed to open panel hardware")?;
        Box::new(EpdDevice::new(interface, geometry.clone()))
    };

    let renderer = ScreenRenderer::new(&geometry, orientation, &config.fonts, &config.assets)
        .context("Failed to set up renderer")?;
    let probe = StatusProbe::new(SystemLink, &config.status);
    let mut worker = DisplayWorker::new(panel, renderer, probe, settings);

    // Capture, lookup and input subsystems are handed clones of `senders`.
    let (senders, mut receivers) = events::channels(EVENT_QUEUE);
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let mut worker_task = tokio::spawn(async move {
        let result = worker.start().await;
        if result.is_ok() {
            worker.run(&mut receivers, &mut shutdown_rx).await;
        }
        worker.teardown();
        result
    });

    // Setup Unix signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        result = &mut worker_task => {
            drop(senders);
            let result = result.context("Display worker panicked")?;
            if let Err(e) = &result {
                error!("Display worker failed: {:#}", e);
            }
            return result;
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    let _ = shutdown_tx.send(()).await;
    drop(senders);
    worker_task.await.context("Display worker panicked")??;

    Ok(())
}
