use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::presenter::Viewport;

/// Slide sampling strategy, chosen once when the pipeline is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SamplerKind {
    /// Uniform pick from a background-built flat list of files.
    #[default]
    List,
    /// Stateless random descent of the tree on every pick.
    Walk,
}

impl SamplerKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Walk => "walk",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SamplerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "walk" => Ok(Self::Walk),
            other => Err(format!("unknown sampler `{other}` (expected `list` or `walk`)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl From<ViewportConfig> for Viewport {
    fn from(cfg: ViewportConfig) -> Self {
        Viewport::new(cfg.width, cfg.height)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Root directory sampled for slides.
    pub show_folder_path: PathBuf,
    /// How long each slide stays on screen.
    pub exposure_seconds: u64,
    /// Emit one log record per displayed slide and per indexer skip.
    pub logging_enabled: bool,
    /// Sampling strategy.
    pub sampler: SamplerKind,
    /// Delay between two producer attempts, whether or not a slide was found.
    #[serde(with = "humantime_serde")]
    pub attempt_delay: Duration,
    /// Head start given to the indexer before the list sampler is first asked.
    #[serde(with = "humantime_serde")]
    pub index_warmup: Duration,
    /// Maximum number of directories one walk may descend through.
    pub max_walk_depth: usize,
    /// Scale images smaller than the viewport up to fill it.
    pub allow_upscale: bool,
    /// Viewport used by the headless presenter.
    pub viewport: ViewportConfig,
    /// Optional deterministic seed for sampling.
    pub rng_seed: Option<u64>,
    /// Optional file that receives a copy of the log.
    pub log_file: Option<PathBuf>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.show_folder_path.as_os_str().is_empty(),
            "show-folder-path must be set"
        );
        ensure!(
            self.exposure_seconds >= 1,
            "exposure-seconds must be at least 1"
        );
        ensure!(
            !self.attempt_delay.is_zero(),
            "attempt-delay must be greater than zero"
        );
        ensure!(
            self.max_walk_depth > 0,
            "max-walk-depth must be greater than zero"
        );
        ensure!(
            self.viewport.width > 0 && self.viewport.height > 0,
            "viewport dimensions must be greater than zero"
        );
        Ok(self)
    }

    pub fn exposure(&self) -> Duration {
        Duration::from_secs(self.exposure_seconds)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            show_folder_path: PathBuf::new(),
            exposure_seconds: 7,
            logging_enabled: true,
            sampler: SamplerKind::default(),
            attempt_delay: Duration::from_millis(100),
            index_warmup: Duration::from_secs(5),
            max_walk_depth: 64,
            allow_upscale: true,
            viewport: ViewportConfig::default(),
            rng_seed: None,
            log_file: None,
        }
    }
}
