//! Map the final edge mask to output colors.

use image::{GrayImage, Luma};

use crate::geometry::BufferGeometry;
use crate::grid::{EDGE, ResultMask};

/// Render `mask` over the unpadded image extent: edges in `foreground`,
/// everything else in `background`.
#[must_use = "returns the rendered edge image"]
#[allow(clippy::cast_possible_truncation)]
pub fn render_edges(
    mask: &ResultMask,
    geometry: &BufferGeometry,
    foreground: Luma<u8>,
    background: Luma<u8>,
) -> GrayImage {
    GrayImage::from_fn(
        geometry.image_width as u32,
        geometry.image_height as u32,
        |x, y| {
            let p = geometry.to_buffer(x as usize, y as usize);
            if mask[p] == EDGE { foreground } else { background }
        },
    )
}

/// Count foreground pixels in a rendered image.
pub(crate) fn count_pixels(image: &GrayImage, color: Luma<u8>) -> u64 {
    image.pixels().map(|p| u64::from(*p == color)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn output_has_image_extent() {
        let geometry = BufferGeometry::new(17, 31, 7);
        let mask: ResultMask = Grid::for_geometry(&geometry);
        let img = render_edges(&mask, &geometry, Luma([0]), Luma([255]));
        assert_eq!((img.width(), img.height()), (17, 31));
        assert_eq!(count_pixels(&img, Luma([255])), 17 * 31);
    }

    #[test]
    fn edges_take_foreground_color() {
        let geometry = BufferGeometry::new(4, 4, 3);
        let mut mask: ResultMask = Grid::for_geometry(&geometry);
        mask[geometry.to_buffer(1, 2)] = EDGE;
        let img = render_edges(&mask, &geometry, Luma([7]), Luma([200]));
        assert_eq!(img.get_pixel(1, 2).0[0], 7);
        assert_eq!(img.get_pixel(2, 1).0[0], 200);
        assert_eq!(count_pixels(&img, Luma([7])), 1);
    }

    #[test]
    fn padding_labels_are_not_rendered() {
        let geometry = BufferGeometry::new(3, 3, 3);
        let mut mask: ResultMask = Grid::for_geometry(&geometry);
        mask[(0, 0)] = EDGE;
        let img = render_edges(&mask, &geometry, Luma([0]), Luma([255]));
        assert_eq!(count_pixels(&img, Luma([0])), 0);
    }
}
