//! End-to-end behavior of the detector on synthetic images.

#![allow(clippy::unwrap_used)]

use std::time::{Duration, Instant};

use castan_pipeline::diagnostics::{Clock, process_with_diagnostics};
use castan_pipeline::{EdgeConfig, GrayImage, PipelineError, detect_edges, process, process_staged};
use image::Luma;

const EDGE: u8 = 0;
const BACKGROUND: u8 = 255;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One-pixel-wide bright vertical line at `x = 20` on a dark 40x40
/// background.
fn bright_line() -> GrayImage {
    GrayImage::from_fn(40, 40, |x, _| Luma([if x == 20 { 255 } else { 0 }]))
}

fn edge_count(edges: &GrayImage) -> usize {
    edges.pixels().filter(|p| p.0[0] == EDGE).count()
}

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

struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

#[test]
fn bright_line_is_traced_on_both_flanks() {
    init_logging();
    let config = EdgeConfig::default()
        .with_window_size(7)
        .with_ratio(0.8)
        .with_smoothing_factor(0.94)
        .with_thinning_factor(0)
        .with_hysteresis(true);
    let edges = detect_edges(&bright_line(), &config);
    assert_eq!(edges.dimensions(), (40, 40));

    // Each flank is one connected vertical run of foreground pixels.
    for y in 3..=36 {
        assert_eq!(edges.get_pixel(19, y).0[0], EDGE, "left flank, row {y}");
        assert_eq!(edges.get_pixel(21, y).0[0], EDGE, "right flank, row {y}");
        assert_eq!(edges.get_pixel(20, y).0[0], BACKGROUND, "line itself, row {y}");
    }
    assert_eq!(edge_count(&edges), 68);

    for (x, y, p) in edges.enumerate_pixels() {
        if p.0[0] == EDGE {
            assert!(x == 19 || x == 21, "stray edge at ({x}, {y})");
        }
    }
}

#[test]
fn bright_line_trace_reports_two_chains() {
    let staged = process_staged(&bright_line(), &EdgeConfig::default());
    assert_eq!(staged.trace_stats.seed_count, 2);
    assert_eq!(staged.trace_stats.edge_count, 68);
    assert!(staged.trace_stats.max_depth >= 17);
}

#[test]
fn repeated_runs_are_identical() {
    let config = EdgeConfig::default().with_thinning_factor(3);
    let first = detect_edges(&bright_line(), &config);
    let second = detect_edges(&bright_line(), &config);
    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn uniform_images_have_no_edges() {
    for level in [0_u8, 77, 128, 255] {
        for size in [24, 40] {
            let img = GrayImage::from_pixel(size, size, Luma([level]));
            let edges = detect_edges(&img, &EdgeConfig::default());
            assert_eq!(edge_count(&edges), 0, "level {level}, size {size}");
        }
    }
}

#[test]
fn decoded_png_matches_in_memory_input() {
    init_logging();
    let img = bright_line();
    let from_bytes = process(&encode_png(&img), &EdgeConfig::default()).unwrap();
    assert_eq!(from_bytes, detect_edges(&img, &EdgeConfig::default()));
}

#[test]
fn empty_bytes_are_rejected() {
    assert!(matches!(
        process(&[], &EdgeConfig::default()),
        Err(PipelineError::EmptyInput)
    ));
}

#[test]
fn zero_width_image_yields_empty_output() {
    let img = GrayImage::new(0, 5);
    let edges = detect_edges(&img, &EdgeConfig::default());
    assert_eq!(edges.dimensions(), (0, 5));
}

#[test]
fn thinning_only_removes_edge_pixels() {
    let full = detect_edges(&bright_line(), &EdgeConfig::default());
    let every = detect_edges(&bright_line(), &EdgeConfig::default().with_thinning_factor(1));
    assert_eq!(full, every, "a stride of one keeps every pixel");

    for k in 2..=5 {
        let thinned = detect_edges(&bright_line(), &EdgeConfig::default().with_thinning_factor(k));
        for (x, y, p) in thinned.enumerate_pixels() {
            if p.0[0] == EDGE {
                assert_eq!(full.get_pixel(x, y).0[0], EDGE, "k={k}: ({x}, {y}) not in unthinned set");
            }
        }
        assert!(edge_count(&thinned) < edge_count(&full), "k={k} removed nothing");
    }
}

#[test]
fn raising_ratio_never_raises_high_threshold() {
    let img = GrayImage::from_fn(40, 40, |x, y| {
        let texture = ((x * 7 + y * 13) % 5) * 40;
        let step = if x > y { 40 } else { 0 };
        Luma([u8::try_from(texture + step).unwrap()])
    });
    let mut previous = f32::INFINITY;
    for step in 1..=10 {
        let ratio = f32::from(u8::try_from(step).unwrap()) / 10.0;
        let config = EdgeConfig::default().with_smoothing_factor(0.6).with_ratio(ratio);
        let high = process_staged(&img, &config).thresholds.high;
        assert!(high <= previous, "ratio {ratio}: high {high} > {previous}");
        previous = high;
    }
}

/// Two-level 8x8 checkerboard with hashed noise.
fn textured(seed: u32) -> GrayImage {
    GrayImage::from_fn(48, 48, |x, y| {
        let base: u32 = if (x / 8 + y / 8) % 2 == 0 { 60 } else { 180 };
        let hash = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663) ^ seed.wrapping_mul(83_492_791))
            .wrapping_mul(2_654_435_761)
            >> 27;
        Luma([u8::try_from(base + hash).unwrap()])
    })
}

#[test]
fn disabling_hysteresis_never_retains_more_edges() {
    init_logging();
    let mut negative_high = 0;
    for seed in 0..40 {
        let img = textured(seed);
        let on = process_staged(&img, &EdgeConfig::default());
        let off = process_staged(&img, &EdgeConfig::default().with_hysteresis(false));
        assert!(on.thresholds.low <= on.thresholds.high, "seed {seed}: low above high");
        assert!(
            off.trace_stats.edge_count <= on.trace_stats.edge_count,
            "seed {seed}: high={} on={} off={}",
            on.thresholds.high,
            on.trace_stats.edge_count,
            off.trace_stats.edge_count,
        );
        for (x, y, p) in off.edges.enumerate_pixels() {
            if p.0[0] == EDGE {
                assert_eq!(on.edges.get_pixel(x, y).0[0], EDGE, "seed {seed}: ({x}, {y})");
            }
        }
        if on.thresholds.high < 0.0 {
            negative_high += 1;
        }
    }
    assert!(negative_high > 0, "no image exercised a negative high threshold");
}

#[test]
fn diagnostics_agree_with_plain_run() {
    init_logging();
    let config = EdgeConfig::default();
    let (staged, diagnostics) = process_with_diagnostics(&bright_line(), &config, &StdClock);
    assert_eq!(staged.edges, detect_edges(&bright_line(), &config));
    assert_eq!(diagnostics.summary.edge_pixel_count, 68);
    assert!(diagnostics.report().contains("Edge pixels: 68"));
}
