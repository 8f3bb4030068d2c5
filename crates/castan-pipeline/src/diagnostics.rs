//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation for parameter tuning.
//! [`process_with_diagnostics`] drives the staged pipeline and records
//! each stage's wall-clock duration together with the metrics the stage
//! reports through [`PipelineStage::metrics`].
//!
//! The library never reads a clock itself: the caller supplies a
//! [`Clock`], so the crate stays free of platform timing concerns.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::{ImageBuffer, Luma, Primitive};
use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{EdgeConfig, StagedResult};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: zero padding.
    pub pad: StageDiagnostics,
    /// Stage 2: ISEF smoothing.
    pub smooth: StageDiagnostics,
    /// Stage 3: BLI sign classification.
    pub classify: StageDiagnostics,
    /// Stage 4: zero crossings and adaptive gradient.
    pub candidates: StageDiagnostics,
    /// Stage 5: threshold estimation.
    pub threshold: StageDiagnostics,
    /// Stage 6: hysteresis tracing.
    pub trace: StageDiagnostics,
    /// Output coloring.
    pub render: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Source image, before any processing.
    Source {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Padded buffer layout.
    Pad {
        /// Buffer width including padding.
        buffer_width: usize,
        /// Buffer height including padding.
        buffer_height: usize,
        /// Padding on each side.
        outline: usize,
    },
    /// ISEF coefficients.
    Smooth {
        /// Configured smoothing factor `c`.
        smoothing_factor: f32,
        /// Causal feed-forward coefficient.
        b1: f32,
        /// Anti-causal feed-forward coefficient.
        b2: f32,
        /// Recursive decay actually applied.
        decay: f32,
    },
    /// BLI sign counts.
    Classify {
        /// Pixels with sign `1`.
        positive_count: u64,
        /// Pixels in the work region.
        region_pixel_count: u64,
    },
    /// Zero-crossing candidates.
    Candidates {
        /// Pixels that passed the zero-crossing test.
        candidate_count: u64,
        /// Smallest gradient value in the work region.
        min_gradient: f32,
        /// Largest gradient value in the work region.
        max_gradient: f32,
    },
    /// Estimated thresholds.
    Threshold {
        /// Retention threshold.
        low: f32,
        /// Seed threshold.
        high: f32,
        /// Configured ratio.
        ratio: f32,
        /// Whether `low` was derived as `high / 2`.
        hysteresis: bool,
    },
    /// Hysteresis tracing.
    Trace {
        /// Chains started.
        seed_count: u64,
        /// Pixels labelled as edges.
        edge_pixel_count: u64,
        /// Pixels visited but dropped.
        discarded_count: u64,
        /// Deepest chain level.
        max_depth: usize,
        /// Configured thinning stride.
        thinning_factor: usize,
    },
    /// Output coloring.
    Render {
        /// Foreground pixels in the output image.
        edge_pixel_count: u64,
        /// Total output pixels.
        total_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Foreground pixels in the output.
    pub edge_pixel_count: u64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!("Edge pixels: {}", self.summary.edge_pixel_count));

        lines.join("\n")
    }

    /// Stages in execution order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 7] {
        [
            ("Pad", &self.pad),
            ("Smooth", &self.smooth),
            ("Classify", &self.classify),
            ("Candidates", &self.candidates),
            ("Threshold", &self.threshold),
            ("Trace", &self.trace),
            ("Render", &self.render),
        ]
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Source { width, height } => format!("{width}x{height}"),
        StageMetrics::Pad {
            buffer_width,
            buffer_height,
            outline,
        } => format!("{buffer_width}x{buffer_height} buffer, outline={outline}"),
        StageMetrics::Smooth {
            smoothing_factor,
            b1,
            b2,
            decay,
        } => format!("c={smoothing_factor:.3} b1={b1:.4} b2={b2:.4} decay={decay:.3}"),
        StageMetrics::Classify {
            positive_count,
            region_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let share = if *region_pixel_count > 0 {
                *positive_count as f64 / *region_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("positive={positive_count} ({share:.1}%)")
        }
        StageMetrics::Candidates {
            candidate_count,
            min_gradient,
            max_gradient,
        } => format!("{candidate_count} candidates, gradient {min_gradient:.2}..{max_gradient:.2}"),
        StageMetrics::Threshold {
            low,
            high,
            ratio,
            hysteresis,
        } => format!("low={low:.2} high={high:.2} ratio={ratio:.2} hysteresis={hysteresis}"),
        StageMetrics::Trace {
            seed_count,
            edge_pixel_count,
            discarded_count,
            max_depth,
            thinning_factor,
        } => format!(
            "seeds={seed_count} edges={edge_pixel_count} discarded={discarded_count} depth={max_depth} thin={thinning_factor}",
        ),
        StageMetrics::Render {
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("edges={edge_pixel_count} ({density:.1}%)")
        }
    }
}

/// Time `step` with `clock`.
fn timed<C: Clock, T>(clock: &C, step: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = step();
    (value, clock.elapsed(&start))
}

/// Diagnostics entry for a stage that has just been reached.
fn record<S: PipelineStage>(stage: &S, duration: Duration) -> StageDiagnostics {
    StageDiagnostics {
        duration,
        metrics: stage.metrics(),
    }
}

/// Run the staged pipeline on `image`, timing every stage with `clock`.
#[must_use]
pub fn process_with_diagnostics<S, C>(
    image: &ImageBuffer<Luma<S>, Vec<S>>,
    config: &EdgeConfig,
    clock: &C,
) -> (StagedResult, PipelineDiagnostics)
where
    S: Primitive + Into<f32>,
    C: Clock,
{
    let run_start = clock.now();
    let pending = Pipeline::new(image, config.clone());

    let (padded, d) = timed(clock, || pending.pad());
    let pad = record(&padded, d);
    let (smoothed, d) = timed(clock, || padded.smooth());
    let smooth = record(&smoothed, d);
    let (classified, d) = timed(clock, || smoothed.classify());
    let classify = record(&classified, d);
    let (located, d) = timed(clock, || classified.locate_candidates());
    let candidates = record(&located, d);
    let (thresholded, d) = timed(clock, || located.estimate_thresholds());
    let threshold = record(&thresholded, d);
    let (traced, d) = timed(clock, || thresholded.trace());
    let trace = record(&traced, d);
    let (staged, d) = timed(clock, || traced.into_result());

    let edge_pixel_count = crate::render::count_pixels(&staged.edges, config.foreground());
    let (width, height) = staged.edges.dimensions();
    let render = StageDiagnostics {
        duration: d,
        metrics: StageMetrics::Render {
            edge_pixel_count,
            total_pixel_count: u64::from(width) * u64::from(height),
        },
    };

    let diagnostics = PipelineDiagnostics {
        pad,
        smooth,
        classify,
        candidates,
        threshold,
        trace,
        render,
        total_duration: clock.elapsed(&run_start),
        summary: PipelineSummary {
            image_width: staged.dimensions.width,
            image_height: staged.dimensions.height,
            pixel_count: u64::from(staged.dimensions.width) * u64::from(staged.dimensions.height),
            edge_pixel_count,
        },
    };
    log::debug!(
        "pipeline finished in {:.3}ms with {edge_pixel_count} edge pixels",
        duration_ms(diagnostics.total_duration),
    );
    (staged, diagnostics)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::GrayImage;

    /// Clock that advances one millisecond per reading.
    struct TickClock {
        ticks: Cell<u64>,
    }

    impl TickClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn step_image() -> GrayImage {
        GrayImage::from_fn(40, 20, |x, _| Luma([if x < 20 { 50 } else { 200 }]))
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn every_stage_is_timed_with_the_supplied_clock() {
        let (_, diag) = process_with_diagnostics(&step_image(), &EdgeConfig::default(), &TickClock::new());
        for (name, stage) in diag.stages() {
            assert_eq!(stage.duration, Duration::from_millis(1), "stage {name}");
        }
        assert!(diag.total_duration >= Duration::from_millis(7));
    }

    #[test]
    fn metrics_match_staged_result() {
        let (staged, diag) =
            process_with_diagnostics(&step_image(), &EdgeConfig::default(), &TickClock::new());
        assert_eq!(
            diag.pad.metrics,
            StageMetrics::Pad {
                buffer_width: 48,
                buffer_height: 28,
                outline: 4,
            }
        );
        match diag.threshold.metrics {
            StageMetrics::Threshold { low, high, .. } => {
                assert!((low - staged.thresholds.low).abs() < f32::EPSILON);
                assert!((high - staged.thresholds.high).abs() < f32::EPSILON);
            }
            ref other => panic!("unexpected metrics {other:?}"),
        }
        match diag.trace.metrics {
            StageMetrics::Trace {
                edge_pixel_count, ..
            } => assert_eq!(edge_pixel_count, staged.trace_stats.edge_count),
            ref other => panic!("unexpected metrics {other:?}"),
        }
        assert_eq!(diag.summary.pixel_count, 800);
        assert_eq!(diag.summary.edge_pixel_count, staged.trace_stats.edge_count);
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) = process_with_diagnostics(&step_image(), &EdgeConfig::default(), &TickClock::new());
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("Image: 40x20 (800 pixels)"));
        for (name, _) in diag.stages() {
            assert!(report.contains(name), "report is missing {name}");
        }
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let (_, diag) = process_with_diagnostics(&step_image(), &EdgeConfig::default(), &TickClock::new());
        let json = serde_json::to_value(&diag).unwrap();
        let secs = json["pad"]["duration"].as_f64().unwrap();
        assert!((secs - 0.001).abs() < 1e-9, "got {secs}");

        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.trace.metrics, diag.trace.metrics);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let json = serde_json::json!({ "duration": -1.0, "metrics": { "Source": { "width": 1, "height": 1 } } });
        assert!(serde_json::from_value::<StageDiagnostics>(json).is_err());
    }
}
