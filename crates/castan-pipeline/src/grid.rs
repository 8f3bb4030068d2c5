//! Flat row-major 2-D buffers shared by all stages.
//!
//! Positions are `(col, row)`; the linear index is `row * width + col`.

use std::ops::{Index, IndexMut};

use crate::geometry::BufferGeometry;

/// Rectangular buffer of `T` stored in a single allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

/// Real-valued samples: original intensities, smoothed image, gradients.
pub type IntensityGrid = Grid<f32>;

/// `1` where the band-limited Laplacian is positive, `0` elsewhere.
pub type SignMask = Grid<u8>;

/// Tracer labels: [`UNVISITED`], [`EDGE`] or [`DISCARDED`].
pub type ResultMask = Grid<u8>;

/// Not yet visited (and, after cleanup, not an edge).
pub const UNVISITED: u8 = 0;
/// Retained edge pixel.
pub const EDGE: u8 = 1;
/// Visited but weak or thinned; reset to [`UNVISITED`] after tracing.
pub const DISCARDED: u8 = 255;

impl<T: Clone + Default> Grid<T> {
    /// Allocate a `width` x `height` grid filled with `T::default()`.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }

    /// Allocate a grid with the padded shape of `geometry`.
    #[must_use]
    pub fn for_geometry(geometry: &BufferGeometry) -> Self {
        Self::new(geometry.buffer_width, geometry.buffer_height)
    }
}

impl<T> Grid<T> {
    /// Grid width (columns).
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height (rows).
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major samples.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Linear index of `(col, row)`.
    #[must_use]
    pub const fn index_of(&self, col: usize, row: usize) -> usize {
        row * self.width + col
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (col, row): (usize, usize)) -> &T {
        &self.data[self.index_of(col, row)]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (col, row): (usize, usize)) -> &mut T {
        let i = self.index_of(col, row);
        &mut self.data[i]
    }
}
