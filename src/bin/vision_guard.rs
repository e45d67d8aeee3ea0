//! vision-guard - motion detection for video files
//!
//! Analyzes each input with an independent pipeline (one thread per input) and prints
//! one report per input, in the order given.
//!
//! Settings come from `VISION_GUARD_CONFIG` and `VISION_GUARD_*` environment variables;
//! command-line flags override both.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;

use vision_guard::config::Settings;
use vision_guard::ui::{BatchGuard, Ui, UiMode};
use vision_guard::{run_timed, AnalysisReport, MotionDetector};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video files (or stub://<scene> synthetic inputs) to analyze.
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Analyze every Nth decoded frame.
    #[arg(long)]
    stride: Option<u32>,
    /// Minimum fraction of changed pixels for a comparison to count as motion.
    #[arg(long)]
    threshold: Option<f64>,
    /// Processing width in pixels.
    #[arg(long)]
    width: Option<u32>,
    /// Processing height in pixels.
    #[arg(long)]
    height: Option<u32>,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
    /// Report partial statistics when decoding fails mid-stream.
    #[arg(long)]
    allow_degraded: bool,
    /// Progress display.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = Settings::load().context("load settings")?;
    if let Some(stride) = args.stride {
        settings.detector.sample_stride = stride;
    }
    if let Some(threshold) = args.threshold {
        settings.detector.motion_threshold = threshold;
    }
    if let Some(width) = args.width {
        settings.detector.processing_width = width;
    }
    if let Some(height) = args.height {
        settings.detector.processing_height = height;
    }
    let detector = MotionDetector::new(settings.detector).context("build motion detector")?;

    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());
    let outcomes = {
        let batch = ui.batch("analyze", args.inputs.len() as u64);
        analyze_all(&detector, &args.inputs, args.allow_degraded, &batch)
    };

    let mut reports: Vec<AnalysisReport> = Vec::with_capacity(outcomes.len());
    let mut failures = 0usize;
    for (input, outcome) in args.inputs.iter().zip(outcomes) {
        match outcome {
            Ok(report) => reports.push(report),
            Err(err) => {
                failures += 1;
                eprintln!("error: {}: {:#}", input, err);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
    }

    if failures > 0 {
        return Err(anyhow!(
            "{} of {} inputs failed",
            failures,
            args.inputs.len()
        ));
    }
    Ok(())
}

/// Run one pipeline per input on scoped threads. Results keep input order; progress is
/// reported as each input finishes.
fn analyze_all(
    detector: &MotionDetector,
    inputs: &[String],
    allow_degraded: bool,
    batch: &BatchGuard,
) -> Vec<Result<AnalysisReport>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                scope.spawn(move || {
                    let outcome = run_timed(detector, input, allow_degraded);
                    batch.finished(input, outcome.is_ok());
                    outcome
                })
            })
            .collect();
        handles
            .into_iter()
            .zip(inputs)
            .map(|(handle, input)| match handle.join() {
                Ok(outcome) => outcome.map_err(anyhow::Error::from),
                Err(_) => {
                    batch.finished(input, false);
                    Err(anyhow!("analysis thread panicked"))
                }
            })
            .collect()
    })
}
