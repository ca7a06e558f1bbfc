//! Adaptive-threshold eye-blink detection for single-channel EEG.
//!
//! Blinks show up in frontal EEG as large, slow excursions of either
//! polarity. This crate finds them offline, over a fixed-length recording:
//!
//! 1. rectify the signal (`|x|`)
//! 2. cut it into non-overlapping windows
//! 3. threshold each window with `median + k × 1.4826 × MAD`
//! 4. localize the largest sample after each crossing
//! 5. drop peaks closer than the refractory period (200 ms by default)
//!
//! # Modules
//!
//! - [`stats`] - median, MAD, robust threshold, quantiles, running moments
//! - [`peak`] - first-occurrence argmax over a sub-range
//! - [`threshold`] - [`WindowThresholder`] rules
//! - [`detector`] - [`BlinkDetector`] and its configuration
//! - [`synth`] - seeded synthetic EEG with ground-truth blinks
//!
//! # Example
//!
//! ```
//! use blinkstone::synth::{simulate_eeg_with_blinks, SynthConfig};
//! use blinkstone::{BlinkDetector, DetectorConfig};
//!
//! let eeg = simulate_eeg_with_blinks(&SynthConfig {
//!     duration_seconds: 30.0,
//!     seed: 1,
//!     ..SynthConfig::default()
//! })
//! .unwrap();
//!
//! let config = DetectorConfig::new(eeg.sample_rate)
//!     .with_window_seconds(3.5)
//!     .with_threshold_multiplier(5.0);
//! let detector = BlinkDetector::new(config).unwrap();
//!
//! let blinks = detector.detect(&eeg.samples).unwrap();
//! assert!(blinks.windows(2).all(|p| p[1] - p[0] > detector.refractory_samples()));
//! ```
//!
//! # Features
//!
//! - `std` (default): std support in `tracing`, `rand` and `rand_distr`
//! - `parallel`: per-window scanning on rayon (`detect_parallel`,
//!   `analyze_parallel`)
//!
//! Without `std` the crate only needs `alloc`.

#![no_std]

extern crate alloc;

pub mod detector;
mod error;
pub mod peak;
pub mod stats;
pub mod synth;
pub mod threshold;

pub use detector::{
    detect_blinks, BlinkDetector, Detection, DetectorConfig, Rectification, WindowSummary,
};
pub use error::{BlinkError, Result};
pub use peak::argmax_in_range;
pub use stats::{mad, median, robust_threshold, RunningStats, MAD_SCALE};
pub use threshold::{
    MeanStdThreshold, QuantileThreshold, RobustThreshold, TrimmedThreshold, WindowThresholder,
};
