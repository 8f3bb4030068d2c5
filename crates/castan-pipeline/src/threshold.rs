//! Adaptive high/low threshold estimation.
//!
//! Gradient values in the work region are scaled from `[min, max]` into
//! 256 histogram bins. Walking down from the strongest bin, the high
//! threshold is the first bin at which the cumulative count reaches
//! `ratio` of all region pixels. With hysteresis `low` is the smaller of
//! `high / 2` and `high`, so it never exceeds `high` even when `high` is
//! negative; without hysteresis `low = high`.

use serde::{Deserialize, Serialize};

use crate::geometry::WorkRegion;
use crate::grid::IntensityGrid;

/// Number of histogram bins.
pub const BINS: usize = 256;

/// Thresholds in gradient units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Traced pixels above this are retained.
    pub low: f32,
    /// Pixels above this seed chains.
    pub high: f32,
}

/// Histogram of gradient values over the work region.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientHistogram {
    /// Per-bin pixel counts.
    pub bins: [u64; BINS],
    /// Smallest gradient value.
    pub min: f32,
    /// Bins per gradient unit: `256 / (max - min + 1)`.
    pub scale: f32,
    /// Total pixels counted.
    pub total: u64,
}

impl GradientHistogram {
    /// Build the histogram of `gradient` over `region`.
    ///
    /// Returns `None` for an empty region.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn build(gradient: &IntensityGrid, region: WorkRegion) -> Option<Self> {
        let (min, max) = region
            .positions()
            .map(|p| gradient[p])
            .fold(None, |acc: Option<(f32, f32)>, g| match acc {
                None => Some((g, g)),
                Some((lo, hi)) => Some((lo.min(g), hi.max(g))),
            })?;

        // The +1 keeps the divisor positive for a flat buffer.
        let scale = BINS as f32 / (max - min + 1.0);
        let mut bins = [0_u64; BINS];
        for p in region.positions() {
            // Rounding can land exactly on BINS for a huge range.
            let k = (((gradient[p] - min) * scale) as usize).min(BINS - 1);
            bins[k] += 1;
        }

        Some(Self {
            bins,
            min,
            scale,
            total: region.pixel_count() as u64,
        })
    }

    /// Highest bin `k` such that bins `k..=255` together hold at least
    /// `ratio * total` pixels, mapped back to gradient units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn high_threshold(&self, ratio: f32) -> f32 {
        let target = ratio * self.total as f32;
        let mut k = BINS - 1;
        let mut count = self.bins[k];
        while (count as f32) < target && k > 0 {
            k -= 1;
            count += self.bins[k];
        }
        k as f32 / self.scale + self.min
    }
}

/// Estimate thresholds from the gradient buffer.
///
/// An empty region yields zero thresholds.
#[must_use]
pub fn estimate_thresholds(
    gradient: &IntensityGrid,
    region: WorkRegion,
    ratio: f32,
    hysteresis: bool,
) -> Thresholds {
    let Some(histogram) = GradientHistogram::build(gradient, region) else {
        return Thresholds { low: 0.0, high: 0.0 };
    };
    let high = histogram.high_threshold(ratio);
    let low = if hysteresis { high.min(high / 2.0) } else { high };
    log::debug!(
        "thresholds: min={:.3} scale={:.5} high={high:.3} low={low:.3} (ratio={ratio})",
        histogram.min,
        histogram.scale,
    );
    Thresholds { low, high }
}
