pub mod directory;
pub mod models;
pub mod scheduler;
pub mod settings;
pub mod surface;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};

use directory::{ChannelDirectory, HttpChannelDirectory, InMemoryDirectory};
use scheduler::{
    commands::{dispatch, ControlCommand},
    Scheduler, SurfError,
};
use settings::SurfSettings;
use surface::SimulatedSurface;

fn build_directory(settings: &SurfSettings) -> Result<Arc<dyn ChannelDirectory>> {
    match &settings.catalog_file {
        Some(path) => {
            info!("Serving channels from catalog file {}", path.display());
            Ok(Arc::new(InMemoryDirectory::from_path(path)?))
        }
        None => {
            info!("Using channel directory at {}", settings.directory_url);
            Ok(Arc::new(HttpChannelDirectory::new(
                settings.directory_url.clone(),
            )?))
        }
    }
}

fn spawn_event_printer(mut events: broadcast::Receiver<scheduler::SurfEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("Failed to serialize event: {err}"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event printer fell behind; skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Runs a surfing session against the configured directory on a headless
/// surface, reading control commands from stdin until `quit` or EOF.
pub async fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("channel-surf starting up...");

    let settings = SurfSettings::load()?;
    let directory = build_directory(&settings)?;

    let (surface, surface_events) = SimulatedSurface::new();
    let scheduler = Scheduler::new(Arc::new(surface), directory, settings);

    spawn_event_printer(scheduler.subscribe());
    let pump = scheduler.spawn_event_pump(surface_events);

    match scheduler.start().await {
        Ok(()) => {}
        Err(SurfError::NoChannels) => {
            eprintln!(
                "No channels available: the directory is empty or unreachable. Submit a video list and try again."
            );
            return Err(SurfError::NoChannels.into());
        }
        Err(err) => return Err(err).context("Failed to start channel surfing session"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
            break;
        }

        let command = match line.parse::<ControlCommand>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        match dispatch(&scheduler, command).await {
            Ok(outcome) => println!("{}", serde_json::to_string(&outcome)?),
            Err(err) => error!("Command failed: {err}"),
        }
    }

    pump.abort();
    info!("channel-surf shutting down");
    Ok(())
}
