//! Run configuration: what to composite, how, and where the output goes.
//!
//! A [`TrailConfig`] is built from defaults, optionally overlaid with a JSON file and then with
//! command-line flags. [`TrailConfig::validate`] runs once, before any source or sink is opened.

use std::{path::Path, path::PathBuf, time::Duration};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{LightrailError, LightrailResult};

/// Which compositor a run uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailMode {
    /// Sliding window of recent frames, max/mean blend.
    #[default]
    Echo,
    /// Single decaying accumulator, max against each new frame.
    Residual,
}

/// Weights applied to the window maximum and window mean in echo mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    /// Share of the window maximum.
    pub max: f64,
    /// Share of the window mean.
    pub mean: f64,
}

impl BlendWeights {
    /// Pure pixelwise maximum over the window.
    pub const MAX_ONLY: Self = Self {
        max: 1.0,
        mean: 0.0,
    };
    /// Trails with a soft body.
    pub const BALANCED: Self = Self {
        max: 0.6,
        mean: 0.4,
    };
    /// Mostly maximum, a little mean.
    pub const BRIGHT: Self = Self {
        max: 0.8,
        mean: 0.2,
    };

    const SUM_TOLERANCE: f64 = 1e-9;

    /// Validated weight pair.
    pub fn new(max: f64, mean: f64) -> LightrailResult<Self> {
        let w = Self { max, mean };
        w.validate()?;
        Ok(w)
    }

    /// Weights with the given max share; the mean gets the rest.
    pub fn from_max(max: f64) -> LightrailResult<Self> {
        Self::new(max, 1.0 - max)
    }

    /// Finite, non-negative, summing to 1.
    pub fn validate(&self) -> LightrailResult<()> {
        if !self.max.is_finite() || !self.mean.is_finite() {
            return Err(LightrailError::config("blend weights must be finite"));
        }
        if self.max < 0.0 || self.mean < 0.0 {
            return Err(LightrailError::config("blend weights must be non-negative"));
        }
        if (self.max + self.mean - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(LightrailError::config(format!(
                "blend weights must sum to 1.0 (got {} + {})",
                self.max, self.mean
            )));
        }
        Ok(())
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self::BALANCED
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `"info"` or `"lightrail=debug,warn"`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Everything a single compositing run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrailConfig {
    /// Compositor selection.
    pub mode: TrailMode,
    /// Integer divisor for both frame dimensions. Must be at least 1.
    pub downscale: i64,
    /// Playback speed multiplier for the recorded file. Must be at least 0.
    pub speed: i64,
    /// Residual mode attenuation per tick, in `(0, 1]`.
    pub decay: f64,
    /// Echo mode window capacity. Must be at least 1.
    pub num_echoes: usize,
    /// Echo mode blend.
    pub weights: BlendWeights,
    /// Nominal frame rate before the speed multiplier.
    pub base_fps: u32,
    /// Capture on a background thread and composite whatever frame is newest each tick.
    pub async_feed: bool,
    /// Write composites to `output`.
    pub record: bool,
    /// Recording path; the extension picks the codec.
    pub output: PathBuf,
    /// Subscriber settings for the binary.
    pub logging: LoggingConfig,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            mode: TrailMode::Echo,
            downscale: 4,
            speed: 1,
            decay: 0.99,
            num_echoes: 60,
            weights: BlendWeights::BALANCED,
            base_fps: 30,
            async_feed: false,
            record: true,
            output: PathBuf::from("out.avi"),
            logging: LoggingConfig::default(),
        }
    }
}

impl TrailConfig {
    /// Parse JSON; missing fields take their defaults, unknown fields are rejected.
    pub fn from_json_str(s: &str) -> LightrailResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| LightrailError::config(format!("invalid config JSON: {e}")))
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: &Path) -> LightrailResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Check every range constraint. All failures are [`LightrailError::Config`].
    pub fn validate(&self) -> LightrailResult<()> {
        if self.downscale < 1 {
            return Err(LightrailError::config(format!(
                "downscale can't be less than one (got {})",
                self.downscale
            )));
        }
        if u32::try_from(self.downscale).is_err() {
            return Err(LightrailError::config("downscale is too large"));
        }
        if self.speed < 0 {
            return Err(LightrailError::config(format!(
                "speed must be non-negative (got {})",
                self.speed
            )));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(LightrailError::config(format!(
                "decay must be in (0, 1] (got {})",
                self.decay
            )));
        }
        if self.num_echoes == 0 {
            return Err(LightrailError::config("num_echoes must be at least 1"));
        }
        if self.base_fps == 0 {
            return Err(LightrailError::config("base_fps must be non-zero"));
        }
        self.weights.validate()
    }

    /// Downscale divisor as an unsigned factor. Only meaningful after [`Self::validate`].
    pub fn downscale_factor(&self) -> u32 {
        u32::try_from(self.downscale.max(1)).unwrap_or(u32::MAX)
    }

    /// Frame rate declared to the sink: `base_fps * speed`, at least 1.
    pub fn sink_fps(&self) -> u32 {
        let speed = u32::try_from(self.speed.max(0)).unwrap_or(u32::MAX);
        self.base_fps.saturating_mul(speed).max(1)
    }

    /// Pacing interval between ticks in async mode.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.base_fps.max(1)))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
