//! Zero-crossing candidates and the adaptive gradient.
//!
//! A pixel is a candidate edge when its BLI sign is `1`, an axis-aligned
//! neighbor's sign is `0`, and the zero crossing satisfies the sign
//! correspondence principle: a positive crossing (towards the next row or
//! column) needs a positive first derivative along that axis, a negative
//! crossing (towards the previous row or column) a negative one. The
//! first neighbor found with sign `0`, checked in the order down, right,
//! up, left, decides.
//!
//! Candidates get the adaptive gradient `avg_off - avg_on` over a square
//! window; every other pixel in the work region gets `0`.

use crate::geometry::WorkRegion;
use crate::grid::{Grid, IntensityGrid, SignMask};

/// Returns `true` if `(col, row)` is a zero crossing of the BLI that
/// passes the sign correspondence test.
///
/// All four axis-aligned neighbors must be inside the grid.
#[must_use]
pub fn is_candidate_edge(bli: &SignMask, smoothed: &IntensityGrid, col: usize, row: usize) -> bool {
    if bli[(col, row)] != 1 {
        return false;
    }
    let vertical = smoothed[(col, row + 1)] - smoothed[(col, row - 1)];
    let horizontal = smoothed[(col + 1, row)] - smoothed[(col - 1, row)];

    if bli[(col, row + 1)] == 0 {
        vertical > 0.0
    } else if bli[(col + 1, row)] == 0 {
        horizontal > 0.0
    } else if bli[(col, row - 1)] == 0 {
        vertical < 0.0
    } else if bli[(col - 1, row)] == 0 {
        horizontal < 0.0
    } else {
        false
    }
}

/// Adaptive gradient at `(col, row)`: mean smoothed intensity of the
/// sign-`0` pixels minus that of the sign-`1` pixels in the
/// `window_size` x `window_size` window. An empty set averages to `0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn adaptive_gradient(
    bli: &SignMask,
    smoothed: &IntensityGrid,
    col: usize,
    row: usize,
    window_size: usize,
) -> f32 {
    let half = window_size / 2;
    let (mut sum_on, mut sum_off) = (0.0_f32, 0.0_f32);
    let (mut num_on, mut num_off) = (0_usize, 0_usize);

    for r in row - half..=row + half {
        for c in col - half..=col + half {
            let value = smoothed[(c, r)];
            if bli[(c, r)] == 0 {
                sum_off += value;
                num_off += 1;
            } else {
                sum_on += value;
                num_on += 1;
            }
        }
    }

    let avg_on = if num_on > 0 { sum_on / num_on as f32 } else { 0.0 };
    let avg_off = if num_off > 0 { sum_off / num_off as f32 } else { 0.0 };
    avg_off - avg_on
}

/// Compute the gradient buffer: adaptive gradient at candidates, `0`
/// elsewhere.
///
/// Zero doubles as "not a candidate" for the tracer.
#[must_use]
pub fn locate_zero_crossings(
    bli: &SignMask,
    smoothed: &IntensityGrid,
    region: WorkRegion,
    window_size: usize,
) -> IntensityGrid {
    let mut gradient = Grid::new(smoothed.width(), smoothed.height());
    let mut candidates = 0_usize;
    for (col, row) in region.positions() {
        if is_candidate_edge(bli, smoothed, col, row) {
            gradient[(col, row)] = adaptive_gradient(bli, smoothed, col, row, window_size);
            candidates += 1;
        }
    }
    log::debug!("zero crossings: {candidates} candidates in {} pixels", region.pixel_count());
    gradient
}

/// Number of non-zero entries (candidates) in a gradient buffer.
#[must_use]
pub fn count_candidates(gradient: &IntensityGrid) -> u64 {
    gradient.as_slice().iter().map(|&g| u64::from(g != 0.0)).sum()
}

/// Smallest and largest gradient values inside `region`.
#[must_use]
pub fn gradient_range(gradient: &IntensityGrid, region: WorkRegion) -> Option<(f32, f32)> {
    region.positions().map(|p| gradient[p]).fold(None, |acc, g| match acc {
        None => Some((g, g)),
        Some((lo, hi)) => Some((lo.min(g), hi.max(g))),
    })
}
