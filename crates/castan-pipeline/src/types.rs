//! Shared types for the castan edge detection pipeline.

use image::Luma;
use serde::{Deserialize, Serialize};

use crate::geometry::BufferGeometry;
use crate::grid::{IntensityGrid, ResultMask, SignMask};
use crate::hysteresis::TraceStats;
use crate::threshold::Thresholds;

/// Re-export `GrayImage` so downstream crates can reference input and
/// output rasters without depending on `image` directly.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Which constant drives the decay term of the ISEF recurrences.
///
/// The feed-forward coefficients `b1`/`b2` always come from the
/// configured smoothing factor. This selects the factor multiplying the
/// previous accumulator value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingRecurrence {
    /// Decay by the configured smoothing factor (consistent filter).
    #[default]
    Configured,
    /// Decay by [`EdgeConfig::DEFAULT_SMOOTHING_FACTOR`] regardless of
    /// the configured value, as in the classic reference code.
    FixedDefault,
}

/// Parameters for one detector run.
///
/// Fields are private so the validated setters are the only way to
/// change them. Rejected values leave the previous value in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EdgeConfigProxy", into = "EdgeConfigProxy")]
pub struct EdgeConfig {
    window_size: usize,
    ratio: f32,
    smoothing_factor: f32,
    thinning_factor: usize,
    hysteresis: bool,
    foreground: Luma<u8>,
    background: Luma<u8>,
    recurrence: SmoothingRecurrence,
}

impl EdgeConfig {
    /// Default adaptive-gradient window side.
    pub const DEFAULT_WINDOW_SIZE: usize = 7;
    /// Default fraction of pixels kept below the high threshold.
    pub const DEFAULT_RATIO: f32 = 0.80;
    /// Default ISEF smoothing factor.
    pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.94;
    /// Default thinning stride (`0` disables thinning).
    pub const DEFAULT_THINNING_FACTOR: usize = 0;
    /// Default edge color (black).
    pub const DEFAULT_FOREGROUND: Luma<u8> = Luma([0]);
    /// Default non-edge color (white).
    pub const DEFAULT_BACKGROUND: Luma<u8> = Luma([255]);

    /// Side of the square adaptive-gradient window (odd, at least 3).
    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Fraction of pixels, counted from the strongest bin down, that
    /// fixes the high threshold.
    #[must_use]
    pub const fn ratio(&self) -> f32 {
        self.ratio
    }

    /// ISEF smoothing factor in `(0, 1)`.
    #[must_use]
    pub const fn smoothing_factor(&self) -> f32 {
        self.smoothing_factor
    }

    /// Keep roughly every n-th pixel along a traced chain (`0` = all).
    #[must_use]
    pub const fn thinning_factor(&self) -> usize {
        self.thinning_factor
    }

    /// Whether weak pixels may be retained (`low = high / 2`).
    #[must_use]
    pub const fn hysteresis(&self) -> bool {
        self.hysteresis
    }

    /// Color of edge pixels in the rendered output.
    #[must_use]
    pub const fn foreground(&self) -> Luma<u8> {
        self.foreground
    }

    /// Color of non-edge pixels in the rendered output.
    #[must_use]
    pub const fn background(&self) -> Luma<u8> {
        self.background
    }

    /// Decay constant policy for the smoothing recurrences.
    #[must_use]
    pub const fn recurrence(&self) -> SmoothingRecurrence {
        self.recurrence
    }

    /// Set the window size. Returns `false` and keeps the previous value
    /// unless `size` is odd and at least 3.
    pub const fn set_window_size(&mut self, size: usize) -> bool {
        if size >= 3 && size % 2 == 1 {
            self.window_size = size;
            true
        } else {
            false
        }
    }

    /// Set the ratio. Returns `false` and keeps the previous value unless
    /// `ratio` is in `(0, 1]`.
    pub fn set_ratio(&mut self, ratio: f32) -> bool {
        if ratio > 0.0 && ratio <= 1.0 {
            self.ratio = ratio;
            true
        } else {
            false
        }
    }

    /// Set the smoothing factor. Returns `false` and keeps the previous
    /// value unless `factor` is in `(0, 1)`.
    pub fn set_smoothing_factor(&mut self, factor: f32) -> bool {
        if factor > 0.0 && factor < 1.0 {
            self.smoothing_factor = factor;
            true
        } else {
            false
        }
    }

    /// Set the thinning stride.
    pub const fn set_thinning_factor(&mut self, factor: usize) {
        self.thinning_factor = factor;
    }

    /// Enable or disable hysteresis.
    pub const fn set_hysteresis(&mut self, enabled: bool) {
        self.hysteresis = enabled;
    }

    /// Set the edge color.
    pub const fn set_foreground(&mut self, color: Luma<u8>) {
        self.foreground = color;
    }

    /// Set the non-edge color.
    pub const fn set_background(&mut self, color: Luma<u8>) {
        self.background = color;
    }

    /// Set the smoothing recurrence policy.
    pub const fn set_recurrence(&mut self, recurrence: SmoothingRecurrence) {
        self.recurrence = recurrence;
    }

    /// Builder form of [`set_window_size`](Self::set_window_size).
    #[must_use]
    pub const fn with_window_size(mut self, size: usize) -> Self {
        self.set_window_size(size);
        self
    }

    /// Builder form of [`set_ratio`](Self::set_ratio).
    #[must_use]
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.set_ratio(ratio);
        self
    }

    /// Builder form of [`set_smoothing_factor`](Self::set_smoothing_factor).
    #[must_use]
    pub fn with_smoothing_factor(mut self, factor: f32) -> Self {
        self.set_smoothing_factor(factor);
        self
    }

    /// Builder form of [`set_thinning_factor`](Self::set_thinning_factor).
    #[must_use]
    pub const fn with_thinning_factor(mut self, factor: usize) -> Self {
        self.set_thinning_factor(factor);
        self
    }

    /// Builder form of [`set_hysteresis`](Self::set_hysteresis).
    #[must_use]
    pub const fn with_hysteresis(mut self, enabled: bool) -> Self {
        self.set_hysteresis(enabled);
        self
    }

    /// Builder form of [`set_foreground`](Self::set_foreground) and
    /// [`set_background`](Self::set_background).
    #[must_use]
    pub const fn with_colors(mut self, foreground: Luma<u8>, background: Luma<u8>) -> Self {
        self.set_foreground(foreground);
        self.set_background(background);
        self
    }

    /// Builder form of [`set_recurrence`](Self::set_recurrence).
    #[must_use]
    pub const fn with_recurrence(mut self, recurrence: SmoothingRecurrence) -> Self {
        self.set_recurrence(recurrence);
        self
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            ratio: Self::DEFAULT_RATIO,
            smoothing_factor: Self::DEFAULT_SMOOTHING_FACTOR,
            thinning_factor: Self::DEFAULT_THINNING_FACTOR,
            hysteresis: true,
            foreground: Self::DEFAULT_FOREGROUND,
            background: Self::DEFAULT_BACKGROUND,
            recurrence: SmoothingRecurrence::default(),
        }
    }
}

/// Unvalidated serde mirror of [`EdgeConfig`].
///
/// Deserialization goes through [`TryFrom`] so invalid JSON configs are
/// rejected instead of bypassing the setters.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct EdgeConfigProxy {
    window_size: usize,
    ratio: f32,
    smoothing_factor: f32,
    thinning_factor: usize,
    hysteresis: bool,
    foreground: u8,
    background: u8,
    recurrence: SmoothingRecurrence,
}

impl Default for EdgeConfigProxy {
    fn default() -> Self {
        EdgeConfig::default().into()
    }
}

impl From<EdgeConfig> for EdgeConfigProxy {
    fn from(config: EdgeConfig) -> Self {
        Self {
            window_size: config.window_size,
            ratio: config.ratio,
            smoothing_factor: config.smoothing_factor,
            thinning_factor: config.thinning_factor,
            hysteresis: config.hysteresis,
            foreground: config.foreground.0[0],
            background: config.background.0[0],
            recurrence: config.recurrence,
        }
    }
}

impl TryFrom<EdgeConfigProxy> for EdgeConfig {
    type Error = PipelineError;

    fn try_from(proxy: EdgeConfigProxy) -> Result<Self, Self::Error> {
        let mut config = Self::default();
        if !config.set_window_size(proxy.window_size) {
            return Err(PipelineError::InvalidConfig(format!(
                "window_size must be odd and at least 3, got {}",
                proxy.window_size
            )));
        }
        if !config.set_ratio(proxy.ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "ratio must be in (0, 1], got {}",
                proxy.ratio
            )));
        }
        if !config.set_smoothing_factor(proxy.smoothing_factor) {
            return Err(PipelineError::InvalidConfig(format!(
                "smoothing_factor must be in (0, 1), got {}",
                proxy.smoothing_factor
            )));
        }
        config.set_thinning_factor(proxy.thinning_factor);
        config.set_hysteresis(proxy.hysteresis);
        config.set_foreground(Luma([proxy.foreground]));
        config.set_background(Luma([proxy.background]));
        config.set_recurrence(proxy.recurrence);
        Ok(config)
    }
}

/// Errors that can occur around the detector.
///
/// The numeric core itself cannot fail; errors come from decoding input
/// bytes or from rejected configuration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Detector configuration is invalid.
    #[error("invalid edge detector configuration: {0}")]
    InvalidConfig(String),
}

/// Every intermediate produced by one run of the staged pipeline.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Configuration the run used.
    pub config: EdgeConfig,
    /// Padded geometry shared by all grids.
    pub geometry: BufferGeometry,
    /// Zero-padded original intensities.
    pub original: IntensityGrid,
    /// ISEF low-pass output.
    pub smoothed: IntensityGrid,
    /// Band-limited Laplacian sign mask.
    pub sign: SignMask,
    /// Adaptive gradient at candidate pixels, zero elsewhere.
    pub gradient: IntensityGrid,
    /// Thresholds estimated from the gradient histogram.
    pub thresholds: Thresholds,
    /// Final binary edge mask (`1` = edge).
    pub mask: ResultMask,
    /// Tracer statistics.
    pub trace_stats: TraceStats,
    /// Colored output over the unpadded extent.
    pub edges: GrayImage,
    /// Dimensions of the source image.
    pub dimensions: Dimensions,
}
