//! Recursive ISEF (infinite symmetric exponential filter) smoothing.
//!
//! Shen and Castan approximate the band-limited Laplacian by the
//! difference between an image and its ISEF-smoothed version. The filter
//! is separable and recursive: along each axis a causal accumulator
//!
//! ```text
//! A[i] = b1 * x[i] + d * A[i - 1]
//! ```
//!
//! runs forward, an anti-causal accumulator
//!
//! ```text
//! B[i] = b2 * x[i] + d * B[i + 1]
//! ```
//!
//! runs backward, and the output is `A[i] + B[i + 1]` (the last line takes
//! `A` alone). With `c` the smoothing factor, `b1 = (1 - c) / (1 + c)` and
//! `b2 = c * b1`. The decay `d` is `c` unless
//! [`SmoothingRecurrence::FixedDefault`] pins it to the default factor.
//!
//! The vertical pass reads the original intensities; the horizontal pass
//! reads and overwrites its output. Only the work region is touched, so
//! the padding stays zero. No clamping is applied.

use crate::geometry::{BufferGeometry, WorkRegion};
use crate::grid::{Grid, IntensityGrid};
use crate::types::{EdgeConfig, SmoothingRecurrence};

/// Feed-forward and decay coefficients of the ISEF recurrences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsefCoefficients {
    /// Causal gain `(1 - c) / (1 + c)`.
    pub b1: f32,
    /// Anti-causal gain `c * b1`.
    pub b2: f32,
    /// Multiplier of the previous accumulator value.
    pub decay: f32,
}

impl IsefCoefficients {
    /// Derive the coefficients for smoothing factor `c`.
    #[must_use]
    pub fn new(c: f32, recurrence: SmoothingRecurrence) -> Self {
        let b1 = (1.0 - c) / (1.0 + c);
        let decay = match recurrence {
            SmoothingRecurrence::Configured => c,
            SmoothingRecurrence::FixedDefault => EdgeConfig::DEFAULT_SMOOTHING_FACTOR,
        };
        Self {
            b1,
            b2: c * b1,
            decay,
        }
    }

    /// Coefficients selected by `config`.
    #[must_use]
    pub fn from_config(config: &EdgeConfig) -> Self {
        Self::new(config.smoothing_factor(), config.recurrence())
    }
}

/// Smooth `original` with the two-pass ISEF filter.
///
/// Returns a new grid with the same padded shape.
#[must_use]
pub fn compute_isef(
    original: &IntensityGrid,
    geometry: &BufferGeometry,
    coefficients: IsefCoefficients,
) -> IntensityGrid {
    let mut smoothed = Grid::for_geometry(geometry);
    if geometry.region.is_empty() {
        return smoothed;
    }

    let mut causal = Grid::for_geometry(geometry);
    let mut anti_causal = Grid::for_geometry(geometry);

    apply_vertical(
        original,
        &mut smoothed,
        &mut causal,
        &mut anti_causal,
        geometry.region,
        coefficients,
    );
    apply_horizontal(
        &mut smoothed,
        &mut causal,
        &mut anti_causal,
        geometry.region,
        coefficients,
    );

    log::debug!(
        "isef: b1={:.5} b2={:.5} decay={:.3} region={}x{}",
        coefficients.b1,
        coefficients.b2,
        coefficients.decay,
        geometry.region.width(),
        geometry.region.height(),
    );
    smoothed
}

/// Filter along columns (top to bottom and back), writing into `output`.
fn apply_vertical(
    input: &IntensityGrid,
    output: &mut IntensityGrid,
    a: &mut IntensityGrid,
    b: &mut IntensityGrid,
    region: WorkRegion,
    k: IsefCoefficients,
) {
    let (first, last) = (region.min_row, region.max_row - 1);
    let cols = region.min_col..region.max_col;

    // Boundary conditions on the first and last row.
    for col in cols.clone() {
        a[(col, first)] = k.b1 * input[(col, first)];
        b[(col, last)] = k.b2 * input[(col, last)];
    }
    for row in first + 1..=last {
        for col in cols.clone() {
            a[(col, row)] = k.b1.mul_add(input[(col, row)], k.decay * a[(col, row - 1)]);
        }
    }
    for row in (first..last).rev() {
        for col in cols.clone() {
            b[(col, row)] = k.b2.mul_add(input[(col, row)], k.decay * b[(col, row + 1)]);
        }
    }

    for col in cols.clone() {
        output[(col, last)] = a[(col, last)];
    }
    for row in first..last {
        for col in cols.clone() {
            output[(col, row)] = a[(col, row)] + b[(col, row + 1)];
        }
    }
}

/// Filter along rows (left to right and back), in place.
fn apply_horizontal(
    data: &mut IntensityGrid,
    a: &mut IntensityGrid,
    b: &mut IntensityGrid,
    region: WorkRegion,
    k: IsefCoefficients,
) {
    let (first, last) = (region.min_col, region.max_col - 1);
    let rows = region.min_row..region.max_row;

    for row in rows.clone() {
        a[(first, row)] = k.b1 * data[(first, row)];
        b[(last, row)] = k.b2 * data[(last, row)];
    }
    for row in rows.clone() {
        for col in first + 1..=last {
            a[(col, row)] = k.b1.mul_add(data[(col, row)], k.decay * a[(col - 1, row)]);
        }
        for col in (first..last).rev() {
            b[(col, row)] = k.b2.mul_add(data[(col, row)], k.decay * b[(col + 1, row)]);
        }
    }

    // Both accumulators are complete, so the input can be overwritten.
    for row in rows {
        data[(last, row)] = a[(last, row)];
        for col in first..last {
            data[(col, row)] = a[(col, row)] + b[(col + 1, row)];
        }
    }
}
