//! Binary band-limited Laplacian (BLI).
//!
//! The difference between the ISEF-smoothed image and the original
//! approximates the band-limited Laplacian. Only its sign is kept.

use crate::geometry::WorkRegion;
use crate::grid::{Grid, IntensityGrid, SignMask};

/// Build the sign mask: `1` where `smoothed - original > 0`, else `0`.
///
/// Pixels outside `region` stay `0`.
#[must_use]
pub fn compute_bli(
    smoothed: &IntensityGrid,
    original: &IntensityGrid,
    region: WorkRegion,
) -> SignMask {
    let mut bli = Grid::new(smoothed.width(), smoothed.height());
    for (col, row) in region.positions() {
        bli[(col, row)] = u8::from(smoothed[(col, row)] - original[(col, row)] > 0.0);
    }
    bli
}

/// Number of positive pixels in a sign mask.
#[must_use]
pub fn count_positive(bli: &SignMask) -> u64 {
    bli.as_slice().iter().map(|&v| u64::from(v)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BufferGeometry;
    use crate::grayscale::pad_intensities;
    use crate::smoothing::{IsefCoefficients, compute_isef};
    use crate::types::EdgeConfig;
    use image::{GrayImage, Luma};

    #[test]
    fn sign_follows_difference() {
        let geometry = BufferGeometry::new(3, 1, 3);
        let mut original: IntensityGrid = Grid::for_geometry(&geometry);
        let mut smoothed: IntensityGrid = Grid::for_geometry(&geometry);
        let row = geometry.outline;
        for (i, (o, s)) in [(10.0, 12.0), (10.0, 10.0), (10.0, 8.0)].into_iter().enumerate() {
            original[(geometry.outline + i, row)] = o;
            smoothed[(geometry.outline + i, row)] = s;
        }
        let bli = compute_bli(&smoothed, &original, geometry.region);
        assert_eq!(bli[(geometry.outline, row)], 1);
        assert_eq!(bli[(geometry.outline + 1, row)], 0);
        assert_eq!(bli[(geometry.outline + 2, row)], 0);
        assert_eq!(count_positive(&bli), 1);
    }

    #[test]
    fn step_image_flips_sign_once_per_row() {
        // Dark left half, bright right half.
        let img = GrayImage::from_fn(40, 20, |x, _| Luma([if x < 20 { 50 } else { 200 }]));
        let config = EdgeConfig::default().with_smoothing_factor(0.5);
        let geometry = BufferGeometry::new(40, 20, config.window_size());
        let original = pad_intensities(&img, &geometry);
        let smoothed = compute_isef(&original, &geometry, IsefCoefficients::from_config(&config));
        let bli = compute_bli(&smoothed, &original, geometry.region);

        // Far from the step the smoothed image settles back onto the
        // input and the mask is 0, so look at a band around the step.
        for y in 4..16 {
            let row: Vec<u8> = (15..25)
                .map(|x| {
                    let (col, r) = geometry.to_buffer(x, y);
                    bli[(col, r)]
                })
                .collect();
            let flips: Vec<usize> = row.windows(2).enumerate().filter(|(_, w)| w[0] != w[1]).map(|(i, _)| i).collect();
            assert_eq!(flips.len(), 1, "row {y}: {row:?}");
            // Smoothing lifts the dark side next to the step and pulls the
            // bright side down, so the mask goes 1 -> 0 with rising intensity.
            let i = flips[0];
            assert_eq!((row[i], row[i + 1]), (1, 0), "row {y}: {row:?}");
            assert_eq!(i + 15, 19, "flip should sit on the step, row {y}");
        }
    }

    #[test]
    fn uniform_image_has_no_positive_pixels() {
        let img = GrayImage::from_pixel(24, 24, Luma([128]));
        let config = EdgeConfig::default();
        let geometry = BufferGeometry::new(24, 24, config.window_size());
        let original = pad_intensities(&img, &geometry);
        let smoothed = compute_isef(&original, &geometry, IsefCoefficients::from_config(&config));
        let bli = compute_bli(&smoothed, &original, geometry.region);
        assert_eq!(count_positive(&bli), 0);
    }
}
