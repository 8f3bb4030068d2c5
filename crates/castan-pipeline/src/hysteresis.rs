//! Hysteresis edge tracing with contour thinning.
//!
//! Every unvisited pixel whose gradient exceeds the high threshold seeds
//! a depth-first trace over 8-connected candidates (non-zero gradient).
//! Each visited pixel is labeled [`EDGE`] if its gradient exceeds the low
//! threshold and [`DISCARDED`] otherwise; a weak pixel still carries the
//! trace on to its neighbors. Once a pixel's neighbors are explored, a
//! pixel that is neither the seed nor a chain end is dropped unless its
//! depth is a multiple of the thinning factor. Finally every
//! [`DISCARDED`] label is cleared, leaving a binary mask.
//!
//! The traversal keeps its frames on a heap-allocated stack instead of
//! the call stack, so chain length is bounded by memory only. Frames are
//! visited in the same order as the natural recursive formulation.

use serde::{Deserialize, Serialize};

use crate::geometry::WorkRegion;
use crate::grid::{DISCARDED, EDGE, Grid, IntensityGrid, ResultMask, UNVISITED};
use crate::threshold::Thresholds;

/// Neighbor offsets `(dcol, drow)` in exploration order.
const NEIGHBORS: [(isize, isize); 8] = [
    (1, 0),
    (-1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Counters gathered while tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Number of traces started from strong pixels.
    pub seed_count: u64,
    /// Deepest chain level reached (`0` for isolated seeds).
    pub max_depth: usize,
    /// Pixels visited but dropped (weak or thinned).
    pub discarded_count: u64,
    /// Pixels retained as edges.
    pub edge_count: u64,
}

/// One level of the explicit traversal stack.
struct Frame {
    col: usize,
    row: usize,
    depth: usize,
    /// Index into [`NEIGHBORS`] of the next neighbor to try.
    next: usize,
    /// Whether any neighbor was visited from here.
    continues: bool,
}

/// Mutable tracing state for one run.
struct Tracer<'a> {
    gradient: &'a IntensityGrid,
    region: WorkRegion,
    low: f32,
    thinning_factor: usize,
    result: ResultMask,
    stack: Vec<Frame>,
    stats: TraceStats,
}

impl Tracer<'_> {
    /// Label `(col, row)` if it can be visited; returns `true` if it was.
    fn visit(&mut self, col: usize, row: usize) -> bool {
        if !self.region.contains(col, row) || self.result[(col, row)] != UNVISITED {
            return false;
        }
        let g = self.gradient[(col, row)];
        if g == 0.0 {
            return false;
        }
        self.result[(col, row)] = if g > self.low { EDGE } else { DISCARDED };
        true
    }

    /// Trace the chain reachable from a seed.
    fn trace_from(&mut self, col: usize, row: usize) {
        if !self.visit(col, row) {
            return;
        }
        self.stats.seed_count += 1;
        self.stack.push(Frame {
            col,
            row,
            depth: 0,
            next: 0,
            continues: false,
        });

        while let Some(top) = self.stack.last_mut() {
            if let Some(&(dc, dr)) = NEIGHBORS.get(top.next) {
                top.next += 1;
                let (Some(nc), Some(nr)) = (top.col.checked_add_signed(dc), top.row.checked_add_signed(dr)) else {
                    continue;
                };
                let depth = top.depth + 1;
                if self.visit(nc, nr) {
                    if let Some(parent) = self.stack.last_mut() {
                        parent.continues = true;
                    }
                    self.stats.max_depth = self.stats.max_depth.max(depth);
                    self.stack.push(Frame {
                        col: nc,
                        row: nr,
                        depth,
                        next: 0,
                        continues: false,
                    });
                }
            } else if let Some(done) = self.stack.pop() {
                self.thin(&done);
            }
        }
    }

    /// Drop an interior chain pixel off the thinning stride.
    fn thin(&mut self, frame: &Frame) {
        if frame.continues
            && frame.depth > 0
            && self.thinning_factor > 0
            && frame.depth % self.thinning_factor != 0
        {
            self.result[(frame.col, frame.row)] = DISCARDED;
        }
    }
}

/// Trace edges and return the final binary mask with statistics.
///
/// The mask has the padded shape of `gradient`; `1` marks an edge.
#[must_use]
pub fn trace_edges(
    gradient: &IntensityGrid,
    region: WorkRegion,
    thresholds: Thresholds,
    thinning_factor: usize,
) -> (ResultMask, TraceStats) {
    let mut tracer = Tracer {
        gradient,
        region,
        low: thresholds.low,
        thinning_factor,
        result: Grid::new(gradient.width(), gradient.height()),
        stack: Vec::new(),
        stats: TraceStats::default(),
    };

    for (col, row) in region.positions() {
        if gradient[(col, row)] > thresholds.high && tracer.result[(col, row)] == UNVISITED {
            tracer.trace_from(col, row);
        }
    }

    let Tracer {
        mut result,
        mut stats,
        ..
    } = tracer;
    for (col, row) in region.positions() {
        match result[(col, row)] {
            DISCARDED => {
                result[(col, row)] = UNVISITED;
                stats.discarded_count += 1;
            }
            EDGE => stats.edge_count += 1,
            _ => {}
        }
    }

    log::debug!(
        "hysteresis: {} seeds, {} edges, {} discarded, max depth {}",
        stats.seed_count,
        stats.edge_count,
        stats.discarded_count,
        stats.max_depth,
    );
    (result, stats)
}
