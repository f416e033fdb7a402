//! Binary entrypoint for the random slideshow.

use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use random_slideshow::config::{Configuration, SamplerKind};
use random_slideshow::events::ControlCommand;
use random_slideshow::logging::init_tracing;
use random_slideshow::pipeline;
use random_slideshow::presenter::TracingPresenter;
use random_slideshow::tasks::control::parse_command;

#[derive(Debug, Parser)]
#[command(
    name = "random-slideshow",
    version,
    about = "Endless random slideshow over a folder tree"
)]
struct Args {
    /// Path to YAML config; defaults apply when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Override the show folder
    #[arg(long, value_name = "DIR")]
    folder: Option<PathBuf>,
    /// Override the exposure in seconds
    #[arg(long, value_name = "SECONDS")]
    exposure: Option<u64>,
    /// Override the sampling strategy (list or walk)
    #[arg(long, value_name = "KIND")]
    sampler: Option<SamplerKind>,
    /// Deterministic RNG seed for sampling
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Copy the log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn configuration(&self) -> Result<Configuration> {
        let mut cfg = match &self.config {
            Some(path) => Configuration::from_yaml_file(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => Configuration::default(),
        };
        if let Some(folder) = &self.folder {
            cfg.show_folder_path = folder.clone();
        }
        if let Some(exposure) = self.exposure {
            cfg.exposure_seconds = exposure;
        }
        if let Some(sampler) = self.sampler {
            cfg.sampler = sampler;
        }
        if let Some(seed) = self.seed {
            cfg.rng_seed = Some(seed);
        }
        if let Some(log_file) = &self.log_file {
            cfg.log_file = Some(log_file.clone());
        }
        cfg.validated().context("invalid configuration values")
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = args.configuration()?;
    let _log_guard = init_tracing(args.verbose, cfg.log_file.as_deref())?;
    tracing::debug!("configuration:\n{cfg:#?}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let result = runtime.block_on(run(cfg));
    // the stdin reader may still be parked in a blocking read
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

async fn run(cfg: Configuration) -> Result<()> {
    let (control_tx, control_rx) = mpsc::channel::<ControlCommand>(16);
    let cancel = CancellationToken::new();

    // Terminal lines: space/enter/p toggle pause, q or escape stops, EOF stops
    if io::stdin().is_terminal() {
        let control = control_tx.clone();
        tokio::task::spawn_blocking(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!("stdin watcher failed: {err}");
                        return;
                    }
                };
                match parse_command(&line) {
                    Some(cmd) => {
                        if control.blocking_send(cmd).is_err() {
                            return;
                        }
                    }
                    None => tracing::info!("unknown command {line:?}; try p or q"),
                }
            }
            tracing::info!("stdin closed; initiating shutdown");
            let _ = control.blocking_send(ControlCommand::Stop);
        });
    } else {
        tracing::debug!("stdin is not a terminal; skipping input watcher");
    }

    {
        let control = control_tx.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            let _ = control.send(ControlCommand::Stop).await;
        });
    }

    #[cfg(unix)]
    {
        let cancel = cancel.clone();
        let control = control_tx.clone();
        tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut sigusr1) => loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        received = sigusr1.recv() => {
                            if received.is_none() {
                                break;
                            }
                            tracing::info!("SIGUSR1 received; toggling pause");
                            if control.send(ControlCommand::TogglePause).await.is_err() {
                                break;
                            }
                        }
                    }
                },
                Err(err) => tracing::warn!("failed to register SIGUSR1 handler: {err}"),
            }
        });
    }
    drop(control_tx);

    let presenter = TracingPresenter::new(cfg.viewport.into());
    pipeline::run(cfg, presenter, control_rx, cancel).await
}
