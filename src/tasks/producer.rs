use std::time::Duration;

use anyhow::{Context, Result};
use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::events::SampleOutcome;
use crate::logging::SLIDE_TARGET;
use crate::pause::PauseController;
use crate::queue::SlideSender;
use crate::sampler::Sampler;

#[derive(Debug, Clone, Copy)]
pub struct ProducerOptions {
    /// Wait after every attempt, successful or not, and while paused.
    pub attempt_delay: Duration,
    /// Wait once before the first attempt.
    pub start_delay: Duration,
    /// Emit one record per decoded slide on [`SLIDE_TARGET`].
    pub log_slides: bool,
}

/// Asks the sampler for a slide and pushes it onto the slide queue.
///
/// Rules:
/// - One sampler invocation per cycle, run on the blocking pool.
/// - A full queue suspends the loop until the consumer pops.
/// - While paused, sampling is skipped but the delay is still observed.
/// - Dead ends and an empty file list are not errors; the next cycle retries.
pub async fn run<S>(
    sampler: S,
    to_consumer: SlideSender,
    pause: PauseController,
    options: ProducerOptions,
    cancel: CancellationToken,
) -> Result<()>
where
    S: Sampler + 'static,
{
    let mut sampler = sampler;
    let mut reported_empty = false;

    if !options.start_delay.is_zero() {
        debug!(delay = ?options.start_delay, "waiting before first sample");
        if !sleep_or_cancel(&cancel, options.start_delay).await {
            return Ok(());
        }
    }

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if !pause.is_paused() {
            let (returned, outcome) = tokio::task::spawn_blocking(move || {
                let outcome = sampler.sample();
                (sampler, outcome)
            })
            .await
            .context("sampler panicked")?;
            sampler = returned;

            match outcome {
                SampleOutcome::Slide(slide) => {
                    reported_empty = false;
                    if options.log_slides {
                        let (width, height) = slide.dimensions();
                        info!(target: SLIDE_TARGET, path = %slide.path.display(), width, height, "slide");
                    }
                    select! {
                        _ = cancel.cancelled() => break,
                        sent = to_consumer.send(slide) => {
                            if sent.is_err() {
                                debug!("slide queue closed");
                                break;
                            }
                        }
                    }
                }
                SampleOutcome::DeadEnd => trace!("dead end; retrying next cycle"),
                SampleOutcome::Empty => {
                    if !reported_empty {
                        warn!("no images available; waiting for the index");
                        reported_empty = true;
                    }
                }
            }
        }

        if !sleep_or_cancel(&cancel, options.attempt_delay).await {
            break;
        }
    }

    debug!("producer stopped");
    Ok(())
}

/// Returns `false` if cancelled before `delay` elapsed.
async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> bool {
    select! {
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}
