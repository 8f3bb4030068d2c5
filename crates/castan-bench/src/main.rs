//! castan-bench: CLI tool for edge detector parameter experimentation.
//!
//! Runs the Shen-Castan pipeline on a given image file with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning the smoothing factor, threshold ratio and window size
//! - Comparing hysteresis and thinning settings
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin castan-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` to see per-stage log records.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use castan_pipeline::diagnostics::{Clock, PipelineDiagnostics, StageDiagnostics};
use castan_pipeline::{EdgeConfig, SmoothingRecurrence};
use clap::Parser;
use image::Luma;

/// Shen-Castan edge detection with per-stage diagnostics.
///
/// Runs the detector on a given image with configurable parameters and
/// prints detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "castan-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Side of the adaptive gradient window (odd, at least 3).
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_WINDOW_SIZE)]
    window_size: usize,

    /// Fraction of work-region pixels used to place the high threshold.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_RATIO)]
    ratio: f32,

    /// ISEF smoothing factor, strictly between 0 and 1.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_SMOOTHING_FACTOR)]
    smoothing_factor: f32,

    /// Keep every Nth pixel along traced chains (0 disables thinning).
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_THINNING_FACTOR)]
    thinning_factor: usize,

    /// Use a single threshold instead of high/low hysteresis.
    #[arg(long)]
    no_hysteresis: bool,

    /// Always use the default smoothing factor as the recursive decay.
    #[arg(long)]
    fixed_recurrence: bool,

    /// Gray level of edge pixels in the output.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_FOREGROUND.0[0])]
    foreground: u8,

    /// Gray level of non-edge pixels in the output.
    #[arg(long, default_value_t = EdgeConfig::DEFAULT_BACKGROUND.0[0])]
    background: u8,

    /// Write the edge image to this PNG file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full detector config as a JSON string.
    ///
    /// When provided, all other detector parameter flags are ignored.
    /// The JSON must be a valid `EdgeConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build an [`EdgeConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags, rejecting out-of-range values.
fn config_from_cli(cli: &Cli) -> Result<EdgeConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = EdgeConfig::default();
    if !config.set_window_size(cli.window_size) {
        return Err(format!(
            "Invalid --window-size {}: must be odd and at least 3",
            cli.window_size
        ));
    }
    if !config.set_ratio(cli.ratio) {
        return Err(format!("Invalid --ratio {}: must be in (0, 1]", cli.ratio));
    }
    if !config.set_smoothing_factor(cli.smoothing_factor) {
        return Err(format!(
            "Invalid --smoothing-factor {}: must be in (0, 1)",
            cli.smoothing_factor
        ));
    }
    config.set_thinning_factor(cli.thinning_factor);
    config.set_hysteresis(!cli.no_hysteresis);
    config.set_foreground(Luma([cli.foreground]));
    config.set_background(Luma([cli.background]));
    config.set_recurrence(if cli.fixed_recurrence {
        SmoothingRecurrence::FixedDefault
    } else {
        SmoothingRecurrence::Configured
    });
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let gray = match castan_pipeline::grayscale::decode_and_grayscale(&image_bytes) {
        Ok(gray) => gray,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        gray.width(),
        gray.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }
        log::info!("run {} of {}", run + 1, cli.runs);

        let (staged, diagnostics) =
            castan_pipeline::diagnostics::process_with_diagnostics(&gray, &config, &StdClock);

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
        }

        // Write the edge image on the first run only.
        if run == 0
            && let Some(ref output_path) = cli.output
        {
            match staged.edges.save(output_path) {
                Ok(()) => eprintln!("Edge image written to {}", output_path.display()),
                Err(e) => {
                    eprintln!("Error writing {}: {e}", output_path.display());
                    return ExitCode::FAILURE;
                }
            }
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
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

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for (index, (name, _)) in first.stages().iter().enumerate() {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .map(|d| stage_ms(d.stages()[index].1))
            .collect();
        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

/// Stage duration in milliseconds.
fn stage_ms(stage: &StageDiagnostics) -> f64 {
    stage.duration.as_secs_f64() * 1000.0
}
