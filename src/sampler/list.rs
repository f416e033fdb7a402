use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use super::{Sampler, load_slide};
use crate::decode::{FsImageDecoder, ImageDecoder};
use crate::events::SampleOutcome;
use crate::file_list::FileList;

/// Uniform pick from a shared [`FileList`].
///
/// Entries that fail to decode are evicted and another pick is made until
/// one succeeds. An empty list yields [`SampleOutcome::Empty`] instead of
/// spinning; the caller retries on its next tick since the indexer may
/// still be appending.
pub struct ListSampler<D = FsImageDecoder> {
    files: FileList,
    decoder: D,
    rng: StdRng,
}

impl<D: ImageDecoder> ListSampler<D> {
    pub fn new(files: FileList, decoder: D, rng: StdRng) -> Self {
        Self { files, decoder, rng }
    }
}

impl<D: ImageDecoder> Sampler for ListSampler<D> {
    fn sample(&mut self) -> SampleOutcome {
        loop {
            let rng = &mut self.rng;
            let Some((idx, path)) = self.files.pick_with(|len| rng.random_range(0..len)) else {
                return SampleOutcome::Empty;
            };
            match load_slide(&self.decoder, &path) {
                Ok(slide) => return SampleOutcome::Slide(slide),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "evicting from file list");
                    self.files.evict(idx, &path);
                }
            }
        }
    }
}
