//! Image decoding, grayscale conversion and padding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! single-channel grayscale image, then copies luminance samples into
//! the work region of a zero-padded [`IntensityGrid`].

use image::{GrayImage, ImageBuffer, Luma, Primitive};

use crate::geometry::BufferGeometry;
use crate::grid::{Grid, IntensityGrid};
use crate::types::PipelineError;

/// Decode raw image bytes and convert to grayscale.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image` crate
/// can decode with the enabled features).
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Copy luminance samples into the work region of a fresh padded grid.
///
/// Works for any sample depth convertible to `f32` (`u8`, `u16`, `f32`).
/// Samples keep their native scale; the border stays zero.
#[must_use]
pub fn pad_intensities<S>(
    image: &ImageBuffer<Luma<S>, Vec<S>>,
    geometry: &BufferGeometry,
) -> IntensityGrid
where
    S: Primitive + Into<f32>,
{
    let mut grid = Grid::for_geometry(geometry);
    for (x, y, pixel) in image.enumerate_pixels() {
        let (col, row) = geometry.to_buffer(x as usize, y as usize);
        grid[(col, row)] = pixel.0[0].into();
    }
    grid
}
