//! Synthetic EEG with injected blink artifacts.
//!
//! Produces a reproducible `(sample_rate, samples)` pair with known blink
//! positions, for tests, benchmarks and demonstrations. The detector never
//! depends on this module.
//!
//! The background is a mix of three oscillations plus Gaussian white noise:
//!
//! ```text
//! x(t) = 30·sin(2π·10t) + 15·sin(2π·6t) + 10·sin(2π·20t) + noise_level·N(0, 1)
//!         alpha             theta           beta
//! ```
//!
//! Each blink adds a Gaussian bump 300 ms wide (σ = 100 ms) peaking at
//! `blink_amplitude`.
//!
//! # Example
//!
//! ```
//! use blinkstone::synth::{simulate_eeg_with_blinks, SynthConfig};
//!
//! let eeg = simulate_eeg_with_blinks(&SynthConfig {
//!     duration_seconds: 20.0,
//!     seed: 7,
//!     ..SynthConfig::default()
//! })
//! .unwrap();
//!
//! assert_eq!(eeg.samples.len(), 20 * 256);
//! assert_eq!(eeg.blink_positions.len(), 5); // 20 s × 0.25 blinks/s
//! ```

use alloc::vec::Vec;
use core::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{BlinkError, Result};

/// Background oscillations as `(frequency Hz, amplitude µV)`.
const BACKGROUND: [(f64, f64); 3] = [(10.0, 30.0), (6.0, 15.0), (20.0, 10.0)];

/// Blink bump width in seconds.
const BLINK_WIDTH_SECONDS: f64 = 0.3;

/// Standard deviation of the blink bump in seconds.
const BLINK_SIGMA_SECONDS: f64 = 0.1;

/// Parameters of the synthetic recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    /// Recording length in seconds
    pub duration_seconds: f64,
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Mean number of blinks per second
    pub blink_rate: f64,
    /// Peak blink amplitude in µV
    pub blink_amplitude: f64,
    /// Standard deviation of the white noise in µV
    pub noise_level: f64,
    /// RNG seed; equal seeds give equal recordings
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 10.0,
            sample_rate: 256.0,
            blink_rate: 0.25,
            blink_amplitude: 150.0,
            noise_level: 20.0,
            seed: 0,
        }
    }
}

impl SynthConfig {
    fn validate(&self) -> Result<()> {
        let checks = [
            ("duration_seconds", self.duration_seconds, false),
            ("sample_rate", self.sample_rate, false),
            ("blink_rate", self.blink_rate, true),
            ("blink_amplitude", self.blink_amplitude, true),
            ("noise_level", self.noise_level, true),
        ];
        for (name, value, zero_ok) in checks {
            let in_range = if zero_ok { value >= 0.0 } else { value > 0.0 };
            if !value.is_finite() || !in_range {
                return Err(BlinkError::invalid(name, value));
            }
        }
        Ok(())
    }
}

/// A generated recording and its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEeg {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Signal samples in µV
    pub samples: Vec<f64>,
    /// Blink centers, ascending
    pub blink_positions: Vec<usize>,
}

/// Generates a recording according to `config`.
///
/// `floor(duration × sample_rate)` samples are produced and
/// `floor(duration × blink_rate)` distinct blink centers are drawn uniformly.
/// Bumps near the edges are clipped to the recording.
///
/// # Errors
///
/// [`BlinkError::InvalidParameter`] for a non-positive duration or sample
/// rate, a negative blink rate, amplitude or noise level, or more blinks than
/// samples.
pub fn simulate_eeg_with_blinks(config: &SynthConfig) -> Result<SyntheticEeg> {
    config.validate()?;

    let fs = config.sample_rate;
    let n_samples = libm::floor(config.duration_seconds * fs) as usize;
    let n_blinks = libm::floor(config.duration_seconds * config.blink_rate) as usize;
    if n_blinks > n_samples {
        return Err(BlinkError::invalid("blink_rate", config.blink_rate));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut samples: Vec<f64> = (0..n_samples)
        .map(|i| {
            let t = i as f64 / fs;
            let background: f64 = BACKGROUND
                .iter()
                .map(|&(freq, amp)| amp * libm::sin(2.0 * PI * freq * t))
                .sum();
            let noise: f64 = rng.sample(StandardNormal);
            background + config.noise_level * noise
        })
        .collect();

    let mut blink_positions = rand::seq::index::sample(&mut rng, n_samples, n_blinks).into_vec();
    blink_positions.sort_unstable();

    let half = (libm::floor(BLINK_WIDTH_SECONDS * fs) as i64) / 2;
    let sigma = BLINK_SIGMA_SECONDS * fs;
    for &pos in &blink_positions {
        for offset in -half..half {
            let idx = pos as i64 + offset;
            if idx < 0 || idx >= n_samples as i64 {
                continue;
            }
            let z = offset as f64 / sigma;
            samples[idx as usize] += config.blink_amplitude * libm::exp(-0.5 * z * z);
        }
    }

    Ok(SyntheticEeg {
        sample_rate: fs,
        samples,
        blink_positions,
    })
}
