//! castan-pipeline: Shen-Castan (ISEF) edge detection (sans-IO).
//!
//! Turns a luminance image into a binary edge image through:
//! pad -> ISEF smoothing -> band-limited Laplacian sign ->
//! zero crossings with adaptive gradient -> threshold estimation ->
//! hysteresis tracing with optional thinning -> render.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images or byte slices and returns images. Reading and writing files
//! lives in `castan-bench`.

pub mod candidates;
pub mod diagnostics;
pub mod geometry;
pub mod grayscale;
pub mod grid;
pub mod hysteresis;
pub mod laplacian;
pub mod pipeline;
pub mod render;
pub mod smoothing;
pub mod threshold;
pub mod types;

use image::{ImageBuffer, Luma, Primitive};

pub use geometry::{BufferGeometry, WorkRegion};
pub use hysteresis::TraceStats;
pub use pipeline::{Pipeline, PipelineStage};
pub use threshold::Thresholds;
pub use types::{
    Dimensions, EdgeConfig, GrayImage, PipelineError, SmoothingRecurrence, StagedResult,
};

/// Run the full detector on an in-memory luminance image.
///
/// The output has the same dimensions as `image`; edge pixels take the
/// configured foreground color and everything else the background.
/// Degenerate inputs (no pixels, uniform intensity) produce an
/// all-background image.
#[must_use]
pub fn detect_edges<S>(image: &ImageBuffer<Luma<S>, Vec<S>>, config: &EdgeConfig) -> GrayImage
where
    S: Primitive + Into<f32>,
{
    process_staged(image, config).edges
}

/// Run the full detector and keep every intermediate buffer.
#[must_use]
pub fn process_staged<S>(image: &ImageBuffer<Luma<S>, Vec<S>>, config: &EdgeConfig) -> StagedResult
where
    S: Primitive + Into<f32>,
{
    Pipeline::new(image, config.clone())
        .pad()
        .smooth()
        .classify()
        .locate_candidates()
        .estimate_thresholds()
        .trace()
        .into_result()
}

/// Decode image bytes (PNG, JPEG, BMP, WebP) and detect edges.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process(image_bytes: &[u8], config: &EdgeConfig) -> Result<GrayImage, PipelineError> {
    let gray = grayscale::decode_and_grayscale(image_bytes)?;
    Ok(detect_edges(&gray, config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Encode a grayscale image as PNG bytes.
    fn encode_png(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &EdgeConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &EdgeConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn uniform_image_has_no_edges() {
        let img = GrayImage::from_pixel(24, 24, Luma([128]));
        let edges = process(&encode_png(&img), &EdgeConfig::default()).unwrap();
        assert_eq!(edges.dimensions(), (24, 24));
        assert!(edges.pixels().all(|p| p.0[0] == 255), "expected all background");
    }

    /// Bright 16x16 square centered on a dark 40x40 background.
    fn bright_square() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            let inside = (12..28).contains(&x) && (12..28).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn bright_square_is_outlined() {
        let edges = detect_edges(&bright_square(), &EdgeConfig::default());
        let count = edges.pixels().filter(|p| p.0[0] == 0).count();
        assert_eq!(count, 64, "expected a 64-pixel outline");
        // The outline sits just outside the square.
        assert_eq!(edges.get_pixel(11, 20).0[0], 0);
        assert_eq!(edges.get_pixel(28, 20).0[0], 0);
        assert_eq!(edges.get_pixel(20, 11).0[0], 0);
        assert_eq!(edges.get_pixel(20, 28).0[0], 0);
        assert_eq!(edges.get_pixel(20, 20).0[0], 255);
    }

    #[test]
    fn step_edge_is_found_on_the_dark_side() {
        let img = GrayImage::from_fn(40, 20, |x, _| Luma([if x < 20 { 50 } else { 200 }]));
        let config = EdgeConfig::default().with_smoothing_factor(0.5);
        let edges = detect_edges(&img, &config);
        for y in 1..19 {
            assert_eq!(edges.get_pixel(19, y).0[0], 0, "row {y}");
        }
        let count = edges.pixels().filter(|p| p.0[0] == 0).count();
        assert_eq!(count, 18);
    }

    #[test]
    fn custom_colors_are_used() {
        let config = EdgeConfig::default().with_colors(Luma([200]), Luma([10]));
        let edges = detect_edges(&bright_square(), &config);
        assert!(edges.pixels().all(|p| p.0[0] == 200 || p.0[0] == 10));
        assert!(edges.pixels().any(|p| p.0[0] == 200));
    }

    #[test]
    fn sixteen_bit_input_matches_scaled_eight_bit() {
        let narrow = bright_square();
        let wide: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_fn(40, 40, |x, y| {
            Luma([u16::from(narrow.get_pixel(x, y).0[0]) * 257])
        });
        let config = EdgeConfig::default();
        assert_eq!(detect_edges(&narrow, &config), detect_edges(&wide, &config));
    }

    #[test]
    fn staged_edges_match_detect_edges() {
        let img = GrayImage::from_fn(30, 30, |x, y| Luma([if x + y < 30 { 40 } else { 220 }]));
        let config = EdgeConfig::default().with_thinning_factor(2);
        assert_eq!(process_staged(&img, &config).edges, detect_edges(&img, &config));
    }
}
