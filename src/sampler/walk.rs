use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use super::{Sampler, load_slide};
use crate::decode::{FsImageDecoder, ImageDecoder};
use crate::events::SampleOutcome;
use crate::indirection::{IndirectionResolver, ShortcutResolver};

const DEFAULT_MAX_DEPTH: usize = 64;

/// Stateless random descent from `root` on every pick.
///
/// One invocation lists a directory, picks a child uniformly and either
/// descends into it or tries to decode it. Children that fail are dropped
/// from the in-memory candidate set (never from disk) and another is picked,
/// so a single invocation decodes each child at most once. Running out of
/// candidates anywhere is a dead end for the whole invocation; there is no
/// backtracking to the parent.
pub struct WalkSampler<D = FsImageDecoder, R = ShortcutResolver> {
    root: PathBuf,
    decoder: D,
    resolver: R,
    rng: StdRng,
    max_depth: usize,
}

enum Candidate {
    Directory(PathBuf),
    File(PathBuf),
    /// Unresolvable indirection, or a pipe, socket or device node.
    Skip,
}

impl<D: ImageDecoder, R: IndirectionResolver> WalkSampler<D, R> {
    pub fn new(root: impl Into<PathBuf>, decoder: D, resolver: R, rng: StdRng) -> Self {
        Self {
            root: root.into(),
            decoder,
            resolver,
            rng,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Cap on the number of directories one invocation may enter. Guards
    /// against indirections that point back up the tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    fn classify(&self, child: &Path) -> Candidate {
        if self.resolver.is_indirection(child) {
            return match self.resolver.resolve(child) {
                Ok(target) => classify_target(target),
                Err(err) => {
                    debug!(path = %child.display(), error = %err, "dropping unresolvable indirection");
                    Candidate::Skip
                }
            };
        }
        classify_target(child.to_path_buf())
    }
}

impl<D: ImageDecoder, R: IndirectionResolver> Sampler for WalkSampler<D, R> {
    fn sample(&mut self) -> SampleOutcome {
        let mut dir = self.root.clone();

        for _ in 0..self.max_depth {
            let mut candidates = match list_children(&dir) {
                Ok(children) => children,
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "cannot list directory");
                    return SampleOutcome::DeadEnd;
                }
            };

            dir = loop {
                if candidates.is_empty() {
                    trace!(dir = %dir.display(), "dead end");
                    return SampleOutcome::DeadEnd;
                }
                let idx = self.rng.random_range(0..candidates.len());
                match self.classify(&candidates[idx]) {
                    Candidate::Directory(next) => break next,
                    Candidate::File(path) => match load_slide(&self.decoder, &path) {
                        Ok(slide) => return SampleOutcome::Slide(slide),
                        Err(err) => {
                            debug!(path = %path.display(), error = %err, "dropping candidate");
                            candidates.swap_remove(idx);
                        }
                    },
                    Candidate::Skip => {
                        candidates.swap_remove(idx);
                    }
                }
            };
        }

        debug!(max_depth = self.max_depth, "walk exceeded maximum depth");
        SampleOutcome::DeadEnd
    }
}

fn classify_target(path: PathBuf) -> Candidate {
    match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Candidate::Directory(path),
        Ok(meta) if meta.is_file() => Candidate::File(path),
        Ok(_) => {
            debug!(path = %path.display(), "dropping special file");
            Candidate::Skip
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "dropping unreadable entry");
            Candidate::Skip
        }
    }
}

fn list_children(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    // read_dir order is platform dependent; sort so seeded runs repeat
    children.sort();
    Ok(children)
}
