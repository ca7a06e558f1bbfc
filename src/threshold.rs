//! Per-window threshold rules.
//!
//! [`WindowThresholder`] is the seam between the detection loop and the
//! statistic used to set each window's threshold. The detector only ever calls
//! [`WindowThresholder::compute`], so a rule can be swapped without touching
//! the scan or the refractory merge.
//!
//! | Rule | Threshold |
//! |------|-----------|
//! | [`RobustThreshold`] (default) | `median + k × 1.4826 × MAD` |
//! | [`RobustThreshold::unscaled`] | `median + k × MAD` |
//! | [`MeanStdThreshold`] | `mean + k × std` |
//! | [`TrimmedThreshold`] | `mean + k × std` after dropping both tails |
//! | [`QuantileThreshold`] | window quantile (`k` unused) |
//!
//! Any `Fn(&[f64], f64) -> Result<f64>` closure is also a rule.
//!
//! # Example
//!
//! ```
//! use blinkstone::{MeanStdThreshold, RobustThreshold, WindowThresholder};
//!
//! let window = [1.0, 2.0, 3.0, 4.0, 100.0];
//!
//! let robust = RobustThreshold::default().compute(&window, 3.0).unwrap();
//! let classic = MeanStdThreshold.compute(&window, 3.0).unwrap();
//!
//! // The outlier inflates the classic rule far more than the robust one
//! assert!(robust < 10.0);
//! assert!(classic > 100.0);
//! ```

use alloc::vec::Vec;

use crate::error::{BlinkError, Result};
use crate::stats::{self, MAD_SCALE};

/// Computes a detection threshold for one window of rectified samples.
pub trait WindowThresholder {
    /// Returns the threshold for `window` at sensitivity `multiplier`.
    ///
    /// # Errors
    ///
    /// Implementations reject an empty window with [`BlinkError::EmptyInput`]
    /// and a negative multiplier with [`BlinkError::InvalidParameter`].
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64>;
}

impl<F> WindowThresholder for F
where
    F: Fn(&[f64], f64) -> Result<f64>,
{
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64> {
        self(window, multiplier)
    }
}

/// Median plus a multiple of the scaled median absolute deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustThreshold {
    scale: f64,
}

impl Default for RobustThreshold {
    fn default() -> Self {
        Self { scale: MAD_SCALE }
    }
}

impl RobustThreshold {
    /// Rule without the Gaussian consistency factor: `median + k × MAD`.
    pub fn unscaled() -> Self {
        Self { scale: 1.0 }
    }

    /// Factor applied to the MAD.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl WindowThresholder for RobustThreshold {
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64> {
        stats::scaled_mad_threshold(window, multiplier, self.scale)
    }
}

/// Mean plus a multiple of the population standard deviation.
///
/// Sensitive to the blink itself: a large excursion raises its own window's
/// threshold. Kept for comparison with the robust rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeanStdThreshold;

impl WindowThresholder for MeanStdThreshold {
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64> {
        stats::check_multiplier(multiplier)?;
        let (mean, std) = stats::mean_std(window)?;
        Ok(mean + multiplier * std)
    }
}

/// Mean plus a multiple of the standard deviation over the central part of
/// the window.
///
/// Samples below the `trim` quantile or above the `1 - trim` quantile are
/// dropped first. If nothing survives the trim, the whole window is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedThreshold {
    trim: f64,
}

impl Default for TrimmedThreshold {
    fn default() -> Self {
        Self { trim: 0.1 }
    }
}

impl TrimmedThreshold {
    /// Creates a trimmed rule dropping `trim` of each tail.
    ///
    /// # Errors
    ///
    /// [`BlinkError::InvalidParameter`] unless `0 <= trim < 0.5`.
    pub fn new(trim: f64) -> Result<Self> {
        if !(0.0..0.5).contains(&trim) {
            return Err(BlinkError::invalid("trim", trim));
        }
        Ok(Self { trim })
    }

    /// Fraction dropped from each tail.
    pub fn trim(&self) -> f64 {
        self.trim
    }
}

impl WindowThresholder for TrimmedThreshold {
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64> {
        stats::check_multiplier(multiplier)?;
        let lo = stats::quantile(window, self.trim)?;
        let hi = stats::quantile(window, 1.0 - self.trim)?;

        let kept: Vec<f64> = window
            .iter()
            .copied()
            .filter(|&v| v >= lo && v <= hi)
            .collect();
        let (mean, std) = if kept.is_empty() {
            stats::mean_std(window)?
        } else {
            stats::mean_std(&kept)?
        };
        Ok(mean + multiplier * std)
    }
}

/// Uses a fixed quantile of the window as its threshold.
///
/// The multiplier is validated for consistency with the other rules but has
/// no effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileThreshold {
    quantile: f64,
}

impl QuantileThreshold {
    /// Creates a rule thresholding at quantile `q`.
    ///
    /// # Errors
    ///
    /// [`BlinkError::InvalidParameter`] unless `0 <= q <= 1`.
    pub fn new(q: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&q) {
            return Err(BlinkError::invalid("quantile", q));
        }
        Ok(Self { quantile: q })
    }

    /// Target quantile.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }
}

impl WindowThresholder for QuantileThreshold {
    fn compute(&self, window: &[f64], multiplier: f64) -> Result<f64> {
        stats::check_multiplier(multiplier)?;
        stats::quantile(window, self.quantile)
    }
}
