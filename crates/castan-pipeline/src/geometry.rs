//! Padded buffer geometry and the interior work region.
//!
//! Every grid in a run shares one padded shape. The source image sits in
//! the middle, surrounded by a zero border of `outline` pixels on each
//! side, so that every neighbor access made for a pixel inside the
//! [`WorkRegion`] (up to `window_size / 2` away) stays in bounds.

use serde::{Deserialize, Serialize};

/// Half-open axis-aligned rectangle `[min, max)` in padded buffer
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRegion {
    /// First column inside the region.
    pub min_col: usize,
    /// First row inside the region.
    pub min_row: usize,
    /// One past the last column inside the region.
    pub max_col: usize,
    /// One past the last row inside the region.
    pub max_row: usize,
}

impl WorkRegion {
    /// Number of columns in the region.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.max_col - self.min_col
    }

    /// Number of rows in the region.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.max_row - self.min_row
    }

    /// Total pixel count of the region.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Returns `true` if the region contains no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns `true` if `(col, row)` lies inside the region.
    #[must_use]
    pub const fn contains(&self, col: usize, row: usize) -> bool {
        col >= self.min_col && col < self.max_col && row >= self.min_row && row < self.max_row
    }

    /// Iterate over `(col, row)` positions in raster order (row-major).
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..self.max_row).flat_map(move |row| (min_col..max_col).map(move |col| (col, row)))
    }
}

/// Padded buffer dimensions for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferGeometry {
    /// Source image width in pixels.
    pub image_width: usize,
    /// Source image height in pixels.
    pub image_height: usize,
    /// Padding on every side: `window_size / 2 + 1`.
    pub outline: usize,
    /// Padded buffer width.
    pub buffer_width: usize,
    /// Padded buffer height.
    pub buffer_height: usize,
    /// Interior region where every stage operates.
    pub region: WorkRegion,
}

impl BufferGeometry {
    /// Compute the geometry for an image of `width` x `height` pixels
    /// processed with a square window of side `window_size`.
    #[must_use]
    pub const fn new(width: usize, height: usize, window_size: usize) -> Self {
        let outline = window_size / 2 + 1;
        let buffer_width = width + 2 * outline;
        let buffer_height = height + 2 * outline;
        Self {
            image_width: width,
            image_height: height,
            outline,
            buffer_width,
            buffer_height,
            region: WorkRegion {
                min_col: outline,
                min_row: outline,
                max_col: buffer_width - outline,
                max_row: buffer_height - outline,
            },
        }
    }

    /// Map an unpadded image coordinate to its padded buffer coordinate.
    #[must_use]
    pub const fn to_buffer(&self, x: usize, y: usize) -> (usize, usize) {
        (x + self.outline, y + self.outline)
    }
}
