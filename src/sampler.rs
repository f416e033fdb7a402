mod list;
mod walk;

use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;

pub use list::ListSampler;
pub use walk::WalkSampler;

use crate::decode::ImageDecoder;
use crate::error::Result;
use crate::events::{SampleOutcome, Slide};

/// Produces at most one slide per invocation. Every invocation terminates:
/// invalid candidates are discarded rather than retried.
///
/// [`WalkSampler`] is not uniform over files: every child of a directory is
/// equally likely, so files in shallow or sparse directories are favoured.
/// [`ListSampler`] is uniform over whatever the indexer has listed so far.
pub trait Sampler: Send {
    fn sample(&mut self) -> SampleOutcome;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn sample(&mut self) -> SampleOutcome {
        (**self).sample()
    }
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Decode `path` into a slide carrying its canonical path.
fn load_slide<D: ImageDecoder + ?Sized>(decoder: &D, path: &Path) -> Result<Slide> {
    let image = decoder.decode(path)?;
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(Slide { image, path })
}
