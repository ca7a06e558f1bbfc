//! Robust and descriptive statistics over finite sample windows.
//!
//! The detection threshold is built from the median and the median absolute
//! deviation (MAD), both of which ignore the handful of large samples a blink
//! contributes to its window:
//!
//! ```text
//! threshold = median(x) + k × 1.4826 × MAD(x)
//! ```
//!
//! The 1.4826 factor makes MAD a consistent estimator of the standard
//! deviation under Gaussian noise, so `k` reads like a z-score.
//!
//! # Example
//!
//! ```
//! use blinkstone::stats::{mad, median, robust_threshold};
//!
//! let window = [1.0, 2.0, 3.0, 4.0, 100.0];
//! assert_eq!(median(&window).unwrap(), 3.0);
//! assert_eq!(mad(&window, 3.0).unwrap(), 1.0);
//!
//! // The outlier barely moves the threshold
//! let th = robust_threshold(&window, 2.0).unwrap();
//! assert!((th - 5.9652).abs() < 1e-9);
//! ```

use alloc::vec::Vec;

use crate::error::{BlinkError, Result};

/// Scale that turns MAD into a standard-deviation estimate for Gaussian data.
pub const MAD_SCALE: f64 = 1.4826;

fn sorted_copy(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(BlinkError::EmptyInput);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    Ok(sorted)
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        0.5 * (sorted[mid - 1] + sorted[mid])
    }
}

/// Returns the sample median.
///
/// For an even count this is the mean of the two central order statistics.
/// The input is left untouched; a private copy is sorted.
///
/// # Errors
///
/// [`BlinkError::EmptyInput`] when `values` is empty.
///
/// # Example
///
/// ```
/// use blinkstone::stats::median;
///
/// assert_eq!(median(&[8.0, 1.0, 4.0, 3.0, 2.0, 5.0, 6.0, 2.0, 8.0]).unwrap(), 4.0);
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
/// assert!(median(&[]).is_err());
/// ```
pub fn median(values: &[f64]) -> Result<f64> {
    let sorted = sorted_copy(values)?;
    Ok(median_of_sorted(&sorted))
}

/// Returns the unscaled median absolute deviation around `center`.
///
/// # Errors
///
/// [`BlinkError::EmptyInput`] when `values` is empty.
pub fn mad(values: &[f64], center: f64) -> Result<f64> {
    let deviations: Vec<f64> = values.iter().map(|&v| libm::fabs(v - center)).collect();
    median(&deviations)
}

/// Computes `median + k × MAD_SCALE × MAD`.
///
/// # Arguments
///
/// * `values` - Window samples
/// * `k` - Threshold multiplier; larger values give fewer, more conservative
///   detections
///
/// # Errors
///
/// - [`BlinkError::InvalidParameter`] when `k` is negative or not finite
/// - [`BlinkError::EmptyInput`] when `values` is empty
pub fn robust_threshold(values: &[f64], k: f64) -> Result<f64> {
    scaled_mad_threshold(values, k, MAD_SCALE)
}

pub(crate) fn scaled_mad_threshold(values: &[f64], k: f64, scale: f64) -> Result<f64> {
    check_multiplier(k)?;
    let center = median(values)?;
    let spread = mad(values, center)?;
    Ok(center + k * scale * spread)
}

pub(crate) fn check_multiplier(k: f64) -> Result<()> {
    if !k.is_finite() || k < 0.0 {
        return Err(BlinkError::invalid("threshold_multiplier", k));
    }
    Ok(())
}

/// Returns the `q`-th quantile using linear interpolation between order
/// statistics (`q = 0.5` is the median).
///
/// # Errors
///
/// - [`BlinkError::InvalidParameter`] when `q` is outside `[0, 1]`
/// - [`BlinkError::EmptyInput`] when `values` is empty
///
/// # Example
///
/// ```
/// use blinkstone::stats::quantile;
///
/// let x = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile(&x, 0.0).unwrap(), 1.0);
/// assert_eq!(quantile(&x, 0.75).unwrap(), 4.0);
/// assert!((quantile(&x, 0.1).unwrap() - 1.4).abs() < 1e-12);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(BlinkError::invalid("quantile", q));
    }
    let sorted = sorted_copy(values)?;
    Ok(quantile_of_sorted(&sorted, q))
}

fn quantile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = libm::floor(pos) as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Returns the mean and population standard deviation of `values`.
///
/// # Errors
///
/// [`BlinkError::EmptyInput`] when `values` is empty.
pub fn mean_std(values: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(BlinkError::EmptyInput);
    }
    let mut stats = RunningStats::new();
    stats.extend(values);
    Ok((stats.mean(), libm::sqrt(stats.population_variance())))
}

/// Single-channel running mean and variance (Welford's algorithm).
///
/// Numerically stable in one pass and without storing samples.
///
/// # Example
///
/// ```
/// use blinkstone::stats::RunningStats;
///
/// let mut stats = RunningStats::new();
/// stats.extend(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
///
/// assert_eq!(stats.mean(), 5.0);
/// assert_eq!(stats.population_variance(), 4.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    /// Adds one sample.
    pub fn update(&mut self, sample: f64) {
        self.count += 1;
        let n = self.count as f64;

        let delta = sample - self.mean;
        self.mean += delta / n;
        let delta2 = sample - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds every sample of a slice.
    pub fn extend(&mut self, samples: &[f64]) {
        for &s in samples {
            self.update(s);
        }
    }

    /// Running mean (0.0 before any sample).
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance with Bessel's correction (0.0 below two samples).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Population variance (divides by n; 0.0 when empty).
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.m2 / self.count as f64
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        libm::sqrt(self.variance())
    }

    /// Number of samples seen.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Clears all accumulated state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
