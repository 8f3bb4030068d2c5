//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use castan_pipeline::{EdgeConfig, Pipeline};
//! # use image::{GrayImage, Luma};
//! let image = GrayImage::from_fn(32, 32, |x, _| Luma([if x < 16 { 0 } else { 255 }]));
//! let traced = Pipeline::new(&image, EdgeConfig::default())
//!     .pad()
//!     .smooth()
//!     .classify()
//!     .locate_candidates()
//!     .estimate_thresholds()
//!     .trace();
//!
//! let staged = traced.into_result();
//! assert_eq!(staged.edges.dimensions(), (32, 32));
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. Every grid is owned
//! by exactly one run and is only written by the stage that creates it.

use image::{ImageBuffer, Luma, Primitive};

use crate::diagnostics::StageMetrics;
use crate::geometry::BufferGeometry;
use crate::grid::{IntensityGrid, ResultMask, SignMask};
use crate::hysteresis::TraceStats;
use crate::smoothing::IsefCoefficients;
use crate::threshold::Thresholds;
use crate::types::{Dimensions, EdgeConfig, GrayImage, PipelineError, StagedResult};

/// Luminance samples converted to `f32`.
type Source = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Entry point for the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Start a run on an in-memory luminance image of any sample depth
    /// convertible to `f32`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new<S>(image: &ImageBuffer<Luma<S>, Vec<S>>, config: EdgeConfig) -> Pending
    where
        S: Primitive + Into<f32>,
    {
        let source = Source::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y).0[0].into()])
        });
        Pending { config, source }
    }

    /// Decode container bytes to 8-bit luminance and start a run.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if `bytes` is empty and
    /// [`PipelineError::ImageDecode`] if decoding fails.
    pub fn from_bytes(bytes: &[u8], config: EdgeConfig) -> Result<Pending, PipelineError> {
        let gray = crate::grayscale::decode_and_grayscale(bytes)?;
        Ok(Self::new(&gray, config))
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .pad() to continue"]
pub struct Pending {
    config: EdgeConfig,
    source: Source,
}

impl Pending {
    /// Source image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.source.width(),
            height: self.source.height(),
        }
    }

    /// Compute the padded geometry and copy the samples into it.
    pub fn pad(self) -> Padded {
        let geometry = BufferGeometry::new(
            self.source.width() as usize,
            self.source.height() as usize,
            self.config.window_size(),
        );
        let original = crate::grayscale::pad_intensities(&self.source, &geometry);
        log::debug!(
            "pad: {}x{} image -> {}x{} buffer (outline {})",
            geometry.image_width,
            geometry.image_height,
            geometry.buffer_width,
            geometry.buffer_height,
            geometry.outline,
        );
        Padded {
            config: self.config,
            geometry,
            original,
        }
    }
}

// ───────────────────────── Stage 1: Padded ───────────────────────────

/// Pipeline state after padding the source intensities.
#[must_use = "pipeline stages are consumed by advancing; call .smooth() to continue"]
pub struct Padded {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
}

impl Padded {
    /// Buffer geometry of this run.
    #[must_use]
    pub const fn geometry(&self) -> &BufferGeometry {
        &self.geometry
    }

    /// Zero-padded original intensities.
    #[must_use]
    pub const fn original(&self) -> &IntensityGrid {
        &self.original
    }

    /// Apply the ISEF filter.
    pub fn smooth(self) -> Smoothed {
        let coefficients = IsefCoefficients::from_config(&self.config);
        let smoothed = crate::smoothing::compute_isef(&self.original, &self.geometry, coefficients);
        Smoothed {
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            coefficients,
            smoothed,
        }
    }
}

// ───────────────────────── Stage 2: Smoothed ─────────────────────────

/// Pipeline state after ISEF smoothing.
#[must_use = "pipeline stages are consumed by advancing; call .classify() to continue"]
pub struct Smoothed {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
    coefficients: IsefCoefficients,
    smoothed: IntensityGrid,
}

impl Smoothed {
    /// ISEF output.
    #[must_use]
    pub const fn smoothed(&self) -> &IntensityGrid {
        &self.smoothed
    }

    /// Coefficients the filter used.
    #[must_use]
    pub const fn coefficients(&self) -> IsefCoefficients {
        self.coefficients
    }

    /// Compute the binary Laplacian sign mask.
    pub fn classify(self) -> Classified {
        let sign = crate::laplacian::compute_bli(&self.smoothed, &self.original, self.geometry.region);
        Classified {
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            coefficients: self.coefficients,
            smoothed: self.smoothed,
            sign,
        }
    }
}

// ───────────────────────── Stage 3: Classified ───────────────────────

/// Pipeline state after building the BLI sign mask.
#[must_use = "pipeline stages are consumed by advancing; call .locate_candidates() to continue"]
pub struct Classified {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
    coefficients: IsefCoefficients,
    smoothed: IntensityGrid,
    sign: SignMask,
}

impl Classified {
    /// BLI sign mask.
    #[must_use]
    pub const fn sign(&self) -> &SignMask {
        &self.sign
    }

    /// Find zero crossings and their adaptive gradients.
    pub fn locate_candidates(self) -> CandidatesLocated {
        let gradient = crate::candidates::locate_zero_crossings(
            &self.sign,
            &self.smoothed,
            self.geometry.region,
            self.config.window_size(),
        );
        CandidatesLocated {
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            coefficients: self.coefficients,
            smoothed: self.smoothed,
            sign: self.sign,
            gradient,
        }
    }
}

// ───────────────────────── Stage 4: CandidatesLocated ────────────────

/// Pipeline state after zero-crossing detection.
#[must_use = "pipeline stages are consumed by advancing; call .estimate_thresholds() to continue"]
pub struct CandidatesLocated {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
    coefficients: IsefCoefficients,
    smoothed: IntensityGrid,
    sign: SignMask,
    gradient: IntensityGrid,
}

impl CandidatesLocated {
    /// Adaptive gradient at candidates, zero elsewhere.
    #[must_use]
    pub const fn gradient(&self) -> &IntensityGrid {
        &self.gradient
    }

    /// Estimate hysteresis thresholds from the gradient histogram.
    pub fn estimate_thresholds(self) -> Thresholded {
        let thresholds = crate::threshold::estimate_thresholds(
            &self.gradient,
            self.geometry.region,
            self.config.ratio(),
            self.config.hysteresis(),
        );
        Thresholded {
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            coefficients: self.coefficients,
            smoothed: self.smoothed,
            sign: self.sign,
            gradient: self.gradient,
            thresholds,
        }
    }
}

// ───────────────────────── Stage 5: Thresholded ──────────────────────

/// Pipeline state after threshold estimation.
#[must_use = "pipeline stages are consumed by advancing; call .trace() to continue"]
pub struct Thresholded {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
    coefficients: IsefCoefficients,
    smoothed: IntensityGrid,
    sign: SignMask,
    gradient: IntensityGrid,
    thresholds: Thresholds,
}

impl Thresholded {
    /// Estimated thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Trace edge chains with hysteresis and thinning.
    pub fn trace(self) -> Traced {
        let (mask, trace_stats) = crate::hysteresis::trace_edges(
            &self.gradient,
            self.geometry.region,
            self.thresholds,
            self.config.thinning_factor(),
        );
        Traced {
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            coefficients: self.coefficients,
            smoothed: self.smoothed,
            sign: self.sign,
            gradient: self.gradient,
            thresholds: self.thresholds,
            mask,
            trace_stats,
        }
    }
}

// ───────────────────────── Stage 6: Traced ───────────────────────────

/// Final pipeline state, after hysteresis tracing.
///
/// Call [`render`](Self::render) for the colored output only, or
/// [`into_result`](Self::into_result) to keep every intermediate.
#[must_use = "call .render() or .into_result() to extract the output"]
pub struct Traced {
    config: EdgeConfig,
    geometry: BufferGeometry,
    original: IntensityGrid,
    coefficients: IsefCoefficients,
    smoothed: IntensityGrid,
    sign: SignMask,
    gradient: IntensityGrid,
    thresholds: Thresholds,
    mask: ResultMask,
    trace_stats: TraceStats,
}

impl Traced {
    /// Final binary edge mask in padded coordinates.
    #[must_use]
    pub const fn mask(&self) -> &ResultMask {
        &self.mask
    }

    /// Tracer statistics.
    #[must_use]
    pub const fn trace_stats(&self) -> TraceStats {
        self.trace_stats
    }

    /// Color the mask over the unpadded extent.
    #[must_use]
    pub fn render(&self) -> GrayImage {
        crate::render::render_edges(
            &self.mask,
            &self.geometry,
            self.config.foreground(),
            self.config.background(),
        )
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn into_result(self) -> StagedResult {
        let edges = self.render();
        StagedResult {
            dimensions: Dimensions {
                width: self.geometry.image_width as u32,
                height: self.geometry.image_height as u32,
            },
            config: self.config,
            geometry: self.geometry,
            original: self.original,
            smoothed: self.smoothed,
            sign: self.sign,
            gradient: self.gradient,
            thresholds: self.thresholds,
            mask: self.mask,
            trace_stats: self.trace_stats,
            edges,
        }
    }
}

// ───────────────────────── PipelineStage trait ───────────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 7;

/// Trait implemented by every pipeline stage.
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"smooth"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `6` for
    /// Traced).
    const INDEX: usize;

    /// Stage-specific metrics describing the work done to reach this
    /// state. [`Pending`] reports only the source dimensions.
    fn metrics(&self) -> StageMetrics;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> StageMetrics {
        let Dimensions { width, height } = self.dimensions();
        StageMetrics::Source { width, height }
    }
}

impl PipelineStage for Padded {
    const NAME: &str = "pad";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Pad {
            buffer_width: self.geometry.buffer_width,
            buffer_height: self.geometry.buffer_height,
            outline: self.geometry.outline,
        }
    }
}

impl PipelineStage for Smoothed {
    const NAME: &str = "smooth";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Smooth {
            smoothing_factor: self.config.smoothing_factor(),
            b1: self.coefficients.b1,
            b2: self.coefficients.b2,
            decay: self.coefficients.decay,
        }
    }
}

impl PipelineStage for Classified {
    const NAME: &str = "classify";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Classify {
            positive_count: crate::laplacian::count_positive(&self.sign),
            region_pixel_count: self.geometry.region.pixel_count() as u64,
        }
    }
}

impl PipelineStage for CandidatesLocated {
    const NAME: &str = "candidates";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        let (min_gradient, max_gradient) =
            crate::candidates::gradient_range(&self.gradient, self.geometry.region)
                .unwrap_or((0.0, 0.0));
        StageMetrics::Candidates {
            candidate_count: crate::candidates::count_candidates(&self.gradient),
            min_gradient,
            max_gradient,
        }
    }
}

impl PipelineStage for Thresholded {
    const NAME: &str = "threshold";
    const INDEX: usize = 5;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Threshold {
            low: self.thresholds.low,
            high: self.thresholds.high,
            ratio: self.config.ratio(),
            hysteresis: self.config.hysteresis(),
        }
    }
}

impl PipelineStage for Traced {
    const NAME: &str = "trace";
    const INDEX: usize = 6;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Trace {
            seed_count: self.trace_stats.seed_count,
            edge_pixel_count: self.trace_stats.edge_count,
            discarded_count: self.trace_stats.discarded_count,
            max_depth: self.trace_stats.max_depth,
            thinning_factor: self.config.thinning_factor(),
        }
    }
}
