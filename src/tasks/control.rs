use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::ControlCommand;
use crate::pause::PauseController;

/// Applies input commands: pause toggles flip the shared flag, a stop
/// cancels the whole pipeline.
pub async fn run(
    mut commands: Receiver<ControlCommand>,
    pause: PauseController,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_cmd = commands.recv() => match maybe_cmd {
                Some(ControlCommand::TogglePause) => {
                    let paused = pause.toggle();
                    info!(paused, "pause toggled");
                }
                Some(ControlCommand::Stop) => {
                    info!("stop requested; shutting down");
                    cancel.cancel();
                    break;
                }
                None => {
                    // Every input source is gone; the show goes on.
                    debug!("control channel closed");
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Map a line typed on the terminal to a command.
///
/// An empty line, `p`, `pause` or a space toggles pause; `q`, `quit`,
/// `exit` or escape stops.
pub fn parse_command(line: &str) -> Option<ControlCommand> {
    if line.trim_end_matches(['\r', '\n']) == " " {
        return Some(ControlCommand::TogglePause);
    }
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" | "pause" => Some(ControlCommand::TogglePause),
        "q" | "quit" | "exit" | "\u{1b}" => Some(ControlCommand::Stop),
        _ => None,
    }
}
