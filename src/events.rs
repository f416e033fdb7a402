use std::path::PathBuf;

use image::RgbaImage;

/// A decoded image paired with its canonical source path.
#[derive(Debug, Clone)]
pub struct Slide {
    pub image: RgbaImage,
    pub path: PathBuf,
}

impl Slide {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Result of one sampler invocation.
#[derive(Debug)]
pub enum SampleOutcome {
    Slide(Slide),
    /// Every candidate reachable this round was exhausted; retry next tick.
    DeadEnd,
    /// The file list holds no entries (yet).
    Empty,
}

impl SampleOutcome {
    pub fn into_slide(self) -> Option<Slide> {
        match self {
            Self::Slide(slide) => Some(slide),
            Self::DeadEnd | Self::Empty => None,
        }
    }
}

/// Commands delivered asynchronously by the input side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    TogglePause,
    Stop,
}
