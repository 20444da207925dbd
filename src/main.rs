use anyhow::{bail, Result};
use clap::Parser;
use std::sync::Arc;
use streamrec::{Cli, Config, Recorder, RunOutcome, StopHandle, SymphoniaOpener};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_with(&cli.config, &cli.overrides())?;

    info!("streamrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Recording {} into {}", cfg.url, cfg.output_folder);
    info!(
        "Segments: {}s, write period: {}s, initial delay: {}s",
        cfg.segment_duration, cfg.write_period, cfg.initial_writer_delay
    );

    let opener = Arc::new(SymphoniaOpener::with_extension(cfg.extension.clone()));
    let recorder = Recorder::new(cfg.recording_config(), opener)?;
    tokio::spawn(forward_signals(recorder.stop_handle()));

    let report = recorder.run().await?;

    match report.outcome() {
        RunOutcome::Clean => info!("Recording finished cleanly"),
        RunOutcome::Environmental => {
            if let Some(err) = report.terminal_error() {
                warn!("Recording ended on stream fault: {}", err);
            }
        }
        RunOutcome::Defective => {
            if let Some(err) = report.unhandled_error() {
                error!("Recording ended on unexpected fault: {}", err);
            }
            bail!("Recording session {} ended on an unexpected fault", report.session_id);
        }
    }

    info!("Exiting main");
    Ok(())
}

/// Translate SIGINT/SIGTERM into a cooperative stop
async fn forward_signals(stop: StopHandle) {
    let name = wait_for_signal().await;
    info!("Received signal {}", name);
    stop.request_stop();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
