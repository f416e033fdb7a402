//! Wires the sampler, queue, loops and controls together for one show.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Configuration, SamplerKind};
use crate::decode::FsImageDecoder;
use crate::events::ControlCommand;
use crate::file_list::FileList;
use crate::indirection::ShortcutResolver;
use crate::pause::PauseController;
use crate::presenter::Presenter;
use crate::queue::slide_queue;
use crate::sampler::{ListSampler, Sampler, WalkSampler, rng_from_seed};
use crate::tasks::consumer::{self, ConsumerOptions};
use crate::tasks::producer::{self, ProducerOptions};
use crate::tasks::{control, indexer};

/// Sampler chosen by `cfg.sampler`, plus the head start the producer should
/// give it before the first pick.
///
/// The list strategy needs `files` filled by an indexer; the walk strategy
/// ignores it.
pub fn build_sampler(cfg: &Configuration, files: &FileList) -> (Box<dyn Sampler>, Duration) {
    let rng = rng_from_seed(cfg.rng_seed);
    match cfg.sampler {
        SamplerKind::List => {
            let sampler: Box<dyn Sampler> =
                Box::new(ListSampler::new(files.clone(), FsImageDecoder, rng));
            (sampler, cfg.index_warmup)
        }
        SamplerKind::Walk => {
            let sampler: Box<dyn Sampler> = Box::new(
                WalkSampler::new(cfg.show_folder_path.clone(), FsImageDecoder, ShortcutResolver, rng)
                    .with_max_depth(cfg.max_walk_depth),
            );
            (sampler, Duration::ZERO)
        }
    }
}

/// Run the slideshow until `cancel` fires or the display loop ends.
///
/// Every spawned task observes `cancel`; when the producer or consumer
/// finishes on its own the token is cancelled so the rest follow.
pub async fn run<P>(
    cfg: Configuration,
    presenter: P,
    commands: Receiver<ControlCommand>,
    cancel: CancellationToken,
) -> Result<()>
where
    P: Presenter + 'static,
{
    info!(
        root = %cfg.show_folder_path.display(),
        sampler = %cfg.sampler,
        exposure = ?cfg.exposure(),
        "starting slideshow"
    );

    let pause = PauseController::new();
    let (to_consumer, from_producer) = slide_queue();
    let files = FileList::new();
    let (sampler, start_delay) = build_sampler(&cfg, &files);

    let mut tasks = JoinSet::new();

    // TreeIndexer (list strategy only)
    if cfg.sampler == SamplerKind::List {
        tasks.spawn({
            let root = cfg.show_folder_path.clone();
            let files = files.clone();
            let cancel = cancel.clone();
            let log_skips = cfg.logging_enabled;
            async move {
                indexer::run(root, Arc::new(ShortcutResolver), files, cancel, log_skips)
                    .await
                    .map(|_| ())
                    .context("indexer task failed")
            }
        });
    }

    // ProducerLoop
    tasks.spawn({
        let pause = pause.clone();
        let cancel = cancel.clone();
        let options = ProducerOptions {
            attempt_delay: cfg.attempt_delay,
            start_delay,
            log_slides: cfg.logging_enabled,
        };
        async move {
            let _stop_all = cancel.clone().drop_guard();
            producer::run(sampler, to_consumer, pause, options, cancel)
                .await
                .context("producer task failed")
        }
    });

    // ConsumerLoop
    tasks.spawn({
        let pause = pause.clone();
        let cancel = cancel.clone();
        let options = ConsumerOptions {
            exposure: cfg.exposure(),
            allow_upscale: cfg.allow_upscale,
        };
        async move {
            let _stop_all = cancel.clone().drop_guard();
            consumer::run(from_producer, presenter, pause, options, cancel)
                .await
                .context("consumer task failed")
        }
    });

    // Input commands
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            control::run(commands, pause, cancel)
                .await
                .context("control task failed")
        }
    });

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("task error: {e:?}"),
            Err(e) => error!("join error: {e}"),
        }
    }

    info!("slideshow stopped");
    Ok(())
}
