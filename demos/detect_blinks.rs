//! Blink detection on a configurable synthetic recording.
//!
//! Generates EEG with known blinks, runs the detector, prints the detected
//! indices, scores them against the ground truth and exports a CSV and a plot.
//!
//! Run with:
//!   cargo run --example detect_blinks                           # Uses detect_blinks.toml
//!   cargo run --example detect_blinks -- --recipe noisy         # Uses embedded recipe
//!   cargo run --example detect_blinks -- --config my.toml       # Uses custom file
//!   cargo run --example detect_blinks -- --seed 7 --threshold 4 # Overrides
//!
//! Set `RUST_LOG=blinkstone=trace` to see per-window thresholds and every
//! suppressed candidate.

mod common;

use blinkstone::synth::{simulate_eeg_with_blinks, SynthConfig};
use blinkstone::{
    BlinkDetector, Detection, DetectorConfig, MeanStdThreshold, QuantileThreshold,
    Rectification, RobustThreshold, TrimmedThreshold, WindowThresholder,
};
use clap::Parser;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Recipe Constants
// ============================================================================

const RECIPE_DEFAULT: &str = r#"
[signal]
duration = 60.0
sample_rate = 256.0
blink_rate = 0.25
blink_amplitude = 150.0
noise_level = 20.0
seed = 42

[detector]
window_seconds = 2.0
threshold_multiplier = 5.0

[output]
plot_path = "output/blinks_default.png"
csv_path = "output/blinks_default.csv"
"#;

const RECIPE_NOISY: &str = r#"
[signal]
duration = 60.0
sample_rate = 256.0
blink_rate = 0.3
blink_amplitude = 120.0
noise_level = 45.0
seed = 42

[detector]
window_seconds = 4.0
threshold_multiplier = 6.0
refractory_seconds = 0.3

[output]
plot_path = "output/blinks_noisy.png"
csv_path = "output/blinks_noisy.csv"
"#;

const RECIPE_FREQUENT: &str = r#"
[signal]
duration = 30.0
sample_rate = 500.0
blink_rate = 1.0
blink_amplitude = 200.0
noise_level = 15.0
seed = 3

[detector]
window_seconds = 1.0
threshold_multiplier = 4.0
refractory_seconds = 0.25

[output]
plot_path = "output/blinks_frequent.png"
csv_path = "output/blinks_frequent.csv"
"#;

const RECIPE_CLASSIC: &str = r#"
[signal]
duration = 60.0
sample_rate = 256.0
blink_rate = 0.25
blink_amplitude = 150.0
noise_level = 20.0
seed = 42

[detector]
window_seconds = 2.0
threshold_multiplier = 2.0
rule = "meanstd"

[output]
plot_path = "output/blinks_classic.png"
csv_path = "output/blinks_classic.csv"
"#;

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Deserialize)]
struct DemoConfig {
    signal: SignalConfig,
    detector: DetectorSection,
    output: OutputConfig,
}

#[derive(Deserialize)]
struct SignalConfig {
    duration: f64,
    sample_rate: f64,
    blink_rate: f64,
    blink_amplitude: f64,
    noise_level: f64,
    seed: u64,
}

#[derive(Deserialize)]
struct DetectorSection {
    window_seconds: f64,
    threshold_multiplier: f64,
    #[serde(default = "default_refractory")]
    refractory_seconds: f64,
    #[serde(default)]
    rectification: RectificationConfig,
    #[serde(default)]
    rule: RuleConfig,
    /// Matching tolerance for scoring, in seconds
    #[serde(default = "default_tolerance")]
    tolerance_seconds: f64,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum RectificationConfig {
    #[default]
    Absolute,
    Raw,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum RuleConfig {
    #[default]
    Robust,
    Unscaled,
    Meanstd,
    Trimmed,
    P95,
}

#[derive(Deserialize)]
struct OutputConfig {
    plot_path: String,
    csv_path: String,
}

fn default_refractory() -> f64 {
    DetectorConfig::DEFAULT_REFRACTORY_SECONDS
}

fn default_tolerance() -> f64 {
    0.15
}

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recipe name (default, noisy, frequent, classic)
    #[arg(short, long)]
    recipe: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Override the signal seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the threshold multiplier
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Skip CSV and PNG export
    #[arg(long)]
    no_export: bool,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    // Load config (priority: --config > --recipe > detect_blinks.toml)
    let config_str = if let Some(config_path) = &args.config {
        info!(path = %config_path, "loading config");
        fs::read_to_string(config_path)?
    } else if let Some(recipe_name) = &args.recipe {
        info!(recipe = %recipe_name, "using recipe");
        load_recipe(recipe_name)?
    } else {
        match fs::read_to_string("detect_blinks.toml") {
            Ok(content) => {
                info!("using detect_blinks.toml");
                content
            }
            Err(_) => {
                info!("no detect_blinks.toml found, using default recipe");
                RECIPE_DEFAULT.to_string()
            }
        }
    };

    let mut config: DemoConfig =
        toml::from_str(&config_str).map_err(|e| format!("Failed to parse TOML config: {}", e))?;
    if let Some(seed) = args.seed {
        config.signal.seed = seed;
    }
    if let Some(k) = args.threshold {
        config.detector.threshold_multiplier = k;
    }

    // Generate signal
    let eeg = simulate_eeg_with_blinks(&SynthConfig {
        duration_seconds: config.signal.duration,
        sample_rate: config.signal.sample_rate,
        blink_rate: config.signal.blink_rate,
        blink_amplitude: config.signal.blink_amplitude,
        noise_level: config.signal.noise_level,
        seed: config.signal.seed,
    })?;
    info!(
        samples = eeg.samples.len(),
        true_blinks = eeg.blink_positions.len(),
        "generated signal"
    );

    // Detect
    let rectification = match config.detector.rectification {
        RectificationConfig::Absolute => Rectification::Absolute,
        RectificationConfig::Raw => Rectification::Raw,
    };
    let detector_config = DetectorConfig::new(eeg.sample_rate)
        .with_window_seconds(config.detector.window_seconds)
        .with_threshold_multiplier(config.detector.threshold_multiplier)
        .with_refractory_seconds(config.detector.refractory_seconds)
        .with_rectification(rectification);

    let started = Instant::now();
    let detection = match config.detector.rule {
        RuleConfig::Robust => run(detector_config, RobustThreshold::default(), &eeg.samples)?,
        RuleConfig::Unscaled => run(detector_config, RobustThreshold::unscaled(), &eeg.samples)?,
        RuleConfig::Meanstd => run(detector_config, MeanStdThreshold, &eeg.samples)?,
        RuleConfig::Trimmed => run(detector_config, TrimmedThreshold::default(), &eeg.samples)?,
        RuleConfig::P95 => run(detector_config, QuantileThreshold::new(0.95)?, &eeg.samples)?,
    };
    let elapsed = started.elapsed();

    let indices: Vec<String> = detection.blinks.iter().map(|i| i.to_string()).collect();
    println!("found {} blinks", detection.blinks.len());
    println!("{}", indices.join(" "));

    // Score against ground truth
    let tolerance = (config.detector.tolerance_seconds * eeg.sample_rate).round() as usize;
    let score = common::match_events(&eeg.blink_positions, &detection.blinks, tolerance);
    println!();
    println!("Scoring (tolerance {} samples):", tolerance);
    println!("  Hits:         {}", score.hits);
    println!("  Misses:       {}", score.misses);
    println!("  False alarms: {}", score.false_alarms);
    println!("  Recall:       {:.1}%", 100.0 * score.recall());
    println!("  Precision:    {:.1}%", 100.0 * score.precision());
    println!("  Detection time: {:.3} ms", elapsed.as_secs_f64() * 1000.0);

    if args.no_export {
        return Ok(());
    }

    // Export results
    common::write_csv(
        &config.output.csv_path,
        &eeg.samples,
        eeg.sample_rate,
        rectification,
        &detection,
    )?;
    common::plot_detection(
        &config.output.plot_path,
        &eeg.samples,
        eeg.sample_rate,
        rectification,
        &detection,
        &eeg.blink_positions,
    )?;

    println!();
    println!("Done!");
    println!("  Plot: {}", config.output.plot_path);
    println!("  CSV: {}", config.output.csv_path);

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_recipe(name: &str) -> Result<String, Box<dyn Error>> {
    match name {
        "default" => Ok(RECIPE_DEFAULT.to_string()),
        "noisy" => Ok(RECIPE_NOISY.to_string()),
        "frequent" => Ok(RECIPE_FREQUENT.to_string()),
        "classic" => Ok(RECIPE_CLASSIC.to_string()),
        _ => Err(format!(
            "Unknown recipe '{}'. Available recipes: default, noisy, frequent, classic",
            name
        )
        .into()),
    }
}

fn run<W: WindowThresholder>(
    config: DetectorConfig,
    rule: W,
    samples: &[f64],
) -> Result<Detection, Box<dyn Error>> {
    let detector = BlinkDetector::with_thresholder(config, rule)?;
    info!(
        window_len = detector.window_len(),
        refractory_samples = detector.refractory_samples(),
        "detector ready"
    );
    Ok(detector.analyze(samples)?)
}
