use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::Slide;
use crate::pause::PauseController;
use crate::presenter::{Presenter, scale_to_viewport};
use crate::queue::SlideReceiver;

#[derive(Debug, Clone, Copy)]
pub struct ConsumerOptions {
    /// How long a slide stays on screen before the next pop.
    pub exposure: Duration,
    /// Grow images smaller than the viewport to fill it.
    pub allow_upscale: bool,
}

/// Pops slides, scales them to the presenter's viewport and shows them.
///
/// Rules:
/// - Each shown slide stays up for one exposure before the next pop.
/// - While paused nothing is popped and the current slide stays on screen.
/// - Pause changes reach the presenter immediately: entering pause overlays
///   the current slide's path, leaving it clears the overlay.
/// - After unpausing the next queued slide is shown right away.
pub async fn run<P: Presenter>(
    mut from_producer: SlideReceiver,
    mut presenter: P,
    pause: PauseController,
    options: ConsumerOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let mut display = Display::default();

    loop {
        let changed = pause.changed();
        tokio::pin!(changed);
        display.sync_overlay(&pause, &mut presenter);

        if pause.is_paused() {
            select! {
                _ = cancel.cancelled() => break,
                _ = &mut changed => continue,
            }
        }

        let slide = select! {
            _ = cancel.cancelled() => break,
            _ = &mut changed => continue,
            maybe = from_producer.recv() => match maybe {
                Some(slide) => slide,
                None => {
                    debug!("slide queue closed");
                    break;
                }
            },
        };

        if let Err(err) = display.show(slide, &mut presenter, options.allow_upscale).await {
            warn!("skipping slide: {err:#}");
            continue;
        }

        let exposure = sleep(options.exposure);
        tokio::pin!(exposure);
        loop {
            let changed = pause.changed();
            tokio::pin!(changed);
            display.sync_overlay(&pause, &mut presenter);
            select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = &mut exposure => break,
                _ = &mut changed => {}
            }
        }
    }

    debug!("consumer stopped");
    Ok(())
}

/// What is on screen right now.
#[derive(Debug, Default)]
struct Display {
    current: Option<PathBuf>,
    overlay: bool,
}

impl Display {
    async fn show<P: Presenter>(&mut self, slide: Slide, presenter: &mut P, allow_upscale: bool) -> Result<()> {
        let Slide { image, path } = slide;
        let viewport = presenter.viewport();
        let scaled = tokio::task::spawn_blocking(move || scale_to_viewport(image, viewport, allow_upscale))
            .await
            .context("resize worker panicked")?
            .with_context(|| format!("scaling {}", path.display()))?;
        debug!(path = %path.display(), width = scaled.width(), height = scaled.height(), "displaying");
        presenter.present(scaled, &path);
        self.current = Some(path);
        Ok(())
    }

    fn sync_overlay<P: Presenter>(&mut self, pause: &PauseController, presenter: &mut P) {
        let paused = pause.is_paused();
        if paused && !self.overlay {
            if let Some(path) = self.current.as_deref() {
                presenter.show_overlay(path);
                self.overlay = true;
            }
        } else if !paused && self.overlay {
            presenter.clear_overlay();
            self.overlay = false;
        }
    }

    #[cfg(test)]
    fn current(&self) -> Option<&std::path::Path> {
        self.current.as_deref()
    }
}
