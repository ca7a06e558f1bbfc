//! Adaptive-threshold blink detection over a single-channel recording.
//!
//! The signal is rectified, cut into consecutive non-overlapping windows, and
//! each window gets its own threshold from a [`WindowThresholder`]. Samples
//! above the threshold start a refractory span; the largest sample in that
//! span becomes a candidate peak. Candidates are then merged left to right so
//! that accepted blinks are more than one refractory period apart, including
//! across window boundaries.
//!
//! ```text
//! raw → |x| → windows → threshold/window → crossings → local max → refractory merge
//! ```
//!
//! # Example
//!
//! ```
//! use blinkstone::{BlinkDetector, DetectorConfig};
//!
//! let sample_rate = 250.0;
//! let mut signal = vec![0.0f32; 1250];
//! signal[510] = -400.0; // polarity does not matter
//! signal[900] = 350.0;
//!
//! let config = DetectorConfig::new(sample_rate)
//!     .with_window_seconds(1.0)
//!     .with_threshold_multiplier(5.0);
//! let detector = BlinkDetector::new(config).unwrap();
//!
//! assert_eq!(detector.detect(&signal).unwrap(), vec![510, 900]);
//! ```
//!
//! # Ordering
//!
//! Windows are processed in ascending order and the refractory merge carries
//! the last accepted index from one window to the next. With the `parallel`
//! feature the per-window scans run on rayon, but the merge still runs once,
//! sequentially, in window order.

use alloc::vec::Vec;

use tracing::{debug, trace};

use crate::error::{BlinkError, Result};
use crate::peak::argmax_in_range;
use crate::stats;
use crate::threshold::{RobustThreshold, WindowThresholder};

/// How samples are mapped before thresholding and peak comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rectification {
    /// Absolute value: `|x|`, so blinks of either polarity are detected
    #[default]
    Absolute,
    /// Samples are used as-is; only positive excursions are detected
    Raw,
}

impl Rectification {
    /// Applies the rectification to one sample.
    #[inline]
    pub fn apply(self, sample: f64) -> f64 {
        match self {
            Rectification::Absolute => libm::fabs(sample),
            Rectification::Raw => sample,
        }
    }
}

/// Detector parameters.
///
/// Durations are given in seconds and converted to sample counts with
/// `round(seconds × sample_rate)`. Every field is validated when a
/// [`BlinkDetector`] is built.
///
/// # Example
///
/// ```
/// use blinkstone::{DetectorConfig, Rectification};
///
/// let config = DetectorConfig::new(256.0)
///     .with_window_seconds(3.5)
///     .with_threshold_multiplier(4.0)
///     .with_refractory_seconds(0.25)
///     .with_rectification(Rectification::Raw);
///
/// assert_eq!(config.window_len().unwrap(), 896);
/// assert_eq!(config.refractory_samples().unwrap(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Sampling rate in Hz
    pub sample_rate: f64,
    /// Window length in seconds
    pub window_seconds: f64,
    /// Threshold multiplier `k` (dimensionless, typically 3-6)
    pub threshold_multiplier: f64,
    /// Minimum spacing between blinks in seconds
    pub refractory_seconds: f64,
    /// Sample mapping applied before detection
    pub rectification: Rectification,
}

impl DetectorConfig {
    /// Default window length in seconds.
    pub const DEFAULT_WINDOW_SECONDS: f64 = 2.0;
    /// Default threshold multiplier.
    pub const DEFAULT_THRESHOLD_MULTIPLIER: f64 = 5.0;
    /// Physiological refractory period of a blink in seconds.
    pub const DEFAULT_REFRACTORY_SECONDS: f64 = 0.2;

    /// Creates a configuration with default window, multiplier, refractory
    /// period and absolute-value rectification.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            window_seconds: Self::DEFAULT_WINDOW_SECONDS,
            threshold_multiplier: Self::DEFAULT_THRESHOLD_MULTIPLIER,
            refractory_seconds: Self::DEFAULT_REFRACTORY_SECONDS,
            rectification: Rectification::Absolute,
        }
    }

    /// Sets the window length in seconds.
    pub fn with_window_seconds(mut self, seconds: f64) -> Self {
        self.window_seconds = seconds;
        self
    }

    /// Sets the threshold multiplier.
    pub fn with_threshold_multiplier(mut self, k: f64) -> Self {
        self.threshold_multiplier = k;
        self
    }

    /// Sets the refractory period in seconds.
    pub fn with_refractory_seconds(mut self, seconds: f64) -> Self {
        self.refractory_seconds = seconds;
        self
    }

    /// Sets the rectification mode.
    pub fn with_rectification(mut self, rectification: Rectification) -> Self {
        self.rectification = rectification;
        self
    }

    /// Checks every field and the derived sample counts.
    ///
    /// # Errors
    ///
    /// [`BlinkError::InvalidParameter`] naming the first offending field: a
    /// non-positive or non-finite sample rate, window or refractory period, a
    /// negative multiplier, or a duration that rounds to zero samples or
    /// overflows `usize`.
    pub fn validate(&self) -> Result<()> {
        positive("sample_rate", self.sample_rate)?;
        positive("window_seconds", self.window_seconds)?;
        positive("refractory_seconds", self.refractory_seconds)?;
        stats::check_multiplier(self.threshold_multiplier)?;
        self.window_len()?;
        self.refractory_samples()?;
        Ok(())
    }

    /// Window length in samples.
    ///
    /// # Errors
    ///
    /// [`BlinkError::InvalidParameter`] if it rounds below one sample or does
    /// not fit in `usize`.
    pub fn window_len(&self) -> Result<usize> {
        to_samples("window_seconds", self.window_seconds, self.sample_rate)
    }

    /// Refractory period in samples.
    ///
    /// # Errors
    ///
    /// [`BlinkError::InvalidParameter`] if it rounds below one sample or does
    /// not fit in `usize`.
    pub fn refractory_samples(&self) -> Result<usize> {
        to_samples(
            "refractory_seconds",
            self.refractory_seconds,
            self.sample_rate,
        )
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BlinkError::invalid(name, value));
    }
    Ok(())
}

fn to_samples(name: &'static str, seconds: f64, sample_rate: f64) -> Result<usize> {
    let samples = libm::round(seconds * sample_rate);
    // `as usize` saturates, so anything at or above usize::MAX is rejected
    if !samples.is_finite() || samples < 1.0 || samples >= usize::MAX as f64 {
        return Err(BlinkError::invalid(name, seconds));
    }
    Ok(samples as usize)
}

/// Threshold and candidate count of one analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    /// First sample of the window
    pub start: usize,
    /// One past the last sample of the window
    pub end: usize,
    /// Threshold computed for this window
    pub threshold: f64,
    /// Candidate peaks found before the refractory merge
    pub candidates: usize,
}

/// Full detection result: accepted blinks plus the per-window thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Accepted blink sample indices, strictly ascending
    pub blinks: Vec<usize>,
    /// One entry per window, in signal order
    pub windows: Vec<WindowSummary>,
}

struct WindowScan {
    summary: WindowSummary,
    candidates: Vec<usize>,
}

/// Batch blink detector.
///
/// Holds a validated [`DetectorConfig`] and the threshold rule. Detection is
/// a pure function of the input: the detector carries no state between calls
/// and never mutates the caller's signal.
///
/// # Type Parameters
///
/// * `W` - Per-window threshold rule, [`RobustThreshold`] by default
///
/// # Example
///
/// ```
/// use blinkstone::{BlinkDetector, DetectorConfig, MeanStdThreshold};
///
/// let config = DetectorConfig::new(100.0).with_window_seconds(1.0);
/// let detector = BlinkDetector::with_thresholder(config, MeanStdThreshold).unwrap();
///
/// let mut signal = vec![0.0f64; 300];
/// signal[150] = 10.0;
///
/// let result = detector.analyze(&signal).unwrap();
/// assert_eq!(result.blinks, vec![150]);
/// assert_eq!(result.windows.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct BlinkDetector<W = RobustThreshold> {
    config: DetectorConfig,
    window_len: usize,
    refractory_samples: usize,
    thresholder: W,
}

impl BlinkDetector<RobustThreshold> {
    /// Creates a detector using the median/MAD threshold rule.
    ///
    /// # Errors
    ///
    /// Any error from [`DetectorConfig::validate`].
    pub fn new(config: DetectorConfig) -> Result<Self> {
        Self::with_thresholder(config, RobustThreshold::default())
    }
}

impl<W: WindowThresholder> BlinkDetector<W> {
    /// Creates a detector with a custom threshold rule.
    ///
    /// # Errors
    ///
    /// Any error from [`DetectorConfig::validate`].
    pub fn with_thresholder(config: DetectorConfig, thresholder: W) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window_len: config.window_len()?,
            refractory_samples: config.refractory_samples()?,
            config,
            thresholder,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Window length in samples.
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Refractory period in samples.
    pub fn refractory_samples(&self) -> usize {
        self.refractory_samples
    }

    /// Returns the threshold rule.
    pub fn thresholder(&self) -> &W {
        &self.thresholder
    }

    /// Detects blinks and returns their sample indices in ascending order.
    ///
    /// An empty signal yields an empty list.
    ///
    /// # Errors
    ///
    /// - [`BlinkError::NonFiniteSample`] if the signal contains NaN or ±∞
    /// - any error raised by the threshold rule
    ///
    /// No partial result is returned on error.
    pub fn detect<S>(&self, signal: &[S]) -> Result<Vec<usize>>
    where
        S: Copy + Into<f64>,
    {
        Ok(self.analyze(signal)?.blinks)
    }

    /// Like [`detect`](Self::detect), but also reports every window's
    /// threshold and candidate count.
    ///
    /// # Errors
    ///
    /// Same as [`detect`](Self::detect).
    pub fn analyze<S>(&self, signal: &[S]) -> Result<Detection>
    where
        S: Copy + Into<f64>,
    {
        let rectified = self.rectify(signal)?;

        let mut scans = Vec::with_capacity(rectified.len().div_ceil(self.window_len));
        for start in (0..rectified.len()).step_by(self.window_len) {
            scans.push(self.scan_window(&rectified, start)?);
        }

        Ok(self.merge(rectified.len(), scans))
    }

    fn rectify<S>(&self, signal: &[S]) -> Result<Vec<f64>>
    where
        S: Copy + Into<f64>,
    {
        let rectification = self.config.rectification;
        signal
            .iter()
            .enumerate()
            .map(|(index, &sample)| {
                let value: f64 = sample.into();
                if !value.is_finite() {
                    return Err(BlinkError::NonFiniteSample { index });
                }
                Ok(rectification.apply(value))
            })
            .collect()
    }

    /// Thresholds one window and collects its candidate peaks.
    fn scan_window(&self, signal: &[f64], start: usize) -> Result<WindowScan> {
        let end = (start + self.window_len).min(signal.len());
        let threshold = self
            .thresholder
            .compute(&signal[start..end], self.config.threshold_multiplier)?;

        let mut candidates = Vec::new();
        let mut j = start;
        while j < end {
            if signal[j] > threshold {
                let stop = j.saturating_add(self.refractory_samples).min(end);
                candidates.push(argmax_in_range(signal, j, stop)?);
                j = j.saturating_add(self.refractory_samples);
            } else {
                j += 1;
            }
        }

        trace!(
            start,
            end,
            threshold,
            candidates = candidates.len(),
            "window scanned"
        );

        Ok(WindowScan {
            summary: WindowSummary {
                start,
                end,
                threshold,
                candidates: candidates.len(),
            },
            candidates,
        })
    }

    /// Accepts candidates in window order, enforcing the refractory spacing.
    fn merge(&self, samples: usize, scans: Vec<WindowScan>) -> Detection {
        let mut blinks = Vec::new();
        let mut windows = Vec::with_capacity(scans.len());
        let mut last: Option<usize> = None;

        for scan in scans {
            for candidate in scan.candidates {
                match last {
                    Some(prev) if candidate <= prev.saturating_add(self.refractory_samples) => {
                        trace!(candidate, prev, "candidate inside refractory period");
                    }
                    _ => {
                        blinks.push(candidate);
                        last = Some(candidate);
                    }
                }
            }
            windows.push(scan.summary);
        }

        debug!(
            samples,
            windows = windows.len(),
            blinks = blinks.len(),
            "blink detection finished"
        );

        Detection { blinks, windows }
    }
}

#[cfg(feature = "parallel")]
impl<W: WindowThresholder + Sync> BlinkDetector<W> {
    /// Parallel [`detect`](Self::detect): windows are scanned on the rayon
    /// pool, then merged sequentially. Output is identical to `detect`.
    ///
    /// # Errors
    ///
    /// Same as [`detect`](Self::detect).
    pub fn detect_parallel<S>(&self, signal: &[S]) -> Result<Vec<usize>>
    where
        S: Copy + Into<f64>,
    {
        Ok(self.analyze_parallel(signal)?.blinks)
    }

    /// Parallel [`analyze`](Self::analyze).
    ///
    /// # Errors
    ///
    /// Same as [`detect`](Self::detect).
    pub fn analyze_parallel<S>(&self, signal: &[S]) -> Result<Detection>
    where
        S: Copy + Into<f64>,
    {
        use rayon::prelude::*;

        let rectified = self.rectify(signal)?;
        let starts: Vec<usize> = (0..rectified.len()).step_by(self.window_len).collect();

        let scans = starts
            .par_iter()
            .map(|&start| self.scan_window(&rectified, start))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.merge(rectified.len(), scans))
    }
}

/// Detects blinks with the default refractory period and rectification.
///
/// Shorthand for building a [`DetectorConfig`] and a median/MAD
/// [`BlinkDetector`].
///
/// # Errors
///
/// Any configuration or detection error.
///
/// # Example
///
/// ```
/// use blinkstone::detect_blinks;
///
/// let mut eeg = vec![0.0f32; 1000];
/// eeg[420] = 250.0;
/// assert_eq!(detect_blinks(&eeg, 250.0, 2.0, 5.0).unwrap(), vec![420]);
/// ```
pub fn detect_blinks<S>(
    signal: &[S],
    sample_rate: f64,
    window_seconds: f64,
    threshold_multiplier: f64,
) -> Result<Vec<usize>>
where
    S: Copy + Into<f64>,
{
    let config = DetectorConfig::new(sample_rate)
        .with_window_seconds(window_seconds)
        .with_threshold_multiplier(threshold_multiplier);
    BlinkDetector::new(config)?.detect(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{simulate_eeg_with_blinks, SynthConfig};
    use crate::threshold::QuantileThreshold;
    use alloc::vec;

    const FS: f64 = 250.0;

    /// 1 s windows (250 samples), 200 ms refractory (50 samples).
    fn detector() -> BlinkDetector {
        let config = DetectorConfig::new(FS)
            .with_window_seconds(1.0)
            .with_threshold_multiplier(5.0);
        BlinkDetector::new(config).unwrap()
    }

    fn assert_well_formed(blinks: &[usize], len: usize, refractory: usize) {
        for pair in blinks.windows(2) {
            assert!(pair[1] > pair[0], "not ascending: {:?}", pair);
            assert!(pair[1] - pair[0] >= refractory, "too close: {:?}", pair);
        }
        assert!(blinks.iter().all(|&b| b < len));
    }

    #[test]
    fn test_config_defaults() {
        let config = DetectorConfig::new(256.0);
        assert_eq!(config.window_seconds, 2.0);
        assert_eq!(config.threshold_multiplier, 5.0);
        assert_eq!(config.refractory_seconds, 0.2);
        assert_eq!(config.rectification, Rectification::Absolute);
        assert_eq!(config.window_len().unwrap(), 512);
        // round(0.2 * 256) = round(51.2)
        assert_eq!(config.refractory_samples().unwrap(), 51);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_lengths_round() {
        let det = BlinkDetector::new(DetectorConfig::new(250.0).with_window_seconds(3.5)).unwrap();
        assert_eq!(det.window_len(), 875);
        assert_eq!(det.refractory_samples(), 50);

        // round(0.3 * 10) = 3, not truncated to 2
        let config = DetectorConfig::new(10.0).with_window_seconds(0.3);
        assert_eq!(config.window_len().unwrap(), 3);
    }

    #[test]
    fn test_invalid_configs() {
        let base = DetectorConfig::new(FS);
        let cases = [
            (DetectorConfig { sample_rate: 0.0, ..base }, "sample_rate"),
            (DetectorConfig { sample_rate: -250.0, ..base }, "sample_rate"),
            (DetectorConfig { sample_rate: f64::NAN, ..base }, "sample_rate"),
            (base.with_window_seconds(0.0), "window_seconds"),
            (base.with_window_seconds(-1.0), "window_seconds"),
            (base.with_refractory_seconds(0.0), "refractory_seconds"),
            (base.with_threshold_multiplier(-1.0), "threshold_multiplier"),
            (base.with_threshold_multiplier(f64::INFINITY), "threshold_multiplier"),
            // 1 ms at 250 Hz rounds to zero samples
            (base.with_window_seconds(0.001), "window_seconds"),
            (base.with_refractory_seconds(0.001), "refractory_seconds"),
        ];

        for (config, field) in cases {
            match BlinkDetector::new(config) {
                Err(BlinkError::InvalidParameter { name, .. }) => assert_eq!(name, field),
                other => panic!("expected InvalidParameter({field}), got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_signal() {
        let result = detector().analyze::<f64>(&[]).unwrap();
        assert!(result.blinks.is_empty());
        assert!(result.windows.is_empty());
    }

    #[test]
    fn test_constant_signals_have_no_detections() {
        let det = detector();
        for value in [0.0, 7.5, -3.0] {
            for len in [1, 249, 250, 1000, 1337] {
                let signal = vec![value; len];
                assert!(det.detect(&signal).unwrap().is_empty(), "{value} x {len}");
            }
        }
    }

    #[test]
    fn test_single_impulse() {
        let det = detector();
        let w = det.window_len();
        let mut signal = vec![0.0f32; 5 * w];
        signal[2 * w + 10] = 1000.0;

        assert_eq!(det.detect(&signal).unwrap(), vec![2 * w + 10]);
    }

    #[test]
    fn test_negative_impulse_needs_rectification() {
        let mut signal = vec![0.0f64; 1000];
        signal[600] = -800.0;

        assert_eq!(detector().detect(&signal).unwrap(), vec![600]);

        let raw = DetectorConfig::new(FS)
            .with_window_seconds(1.0)
            .with_rectification(Rectification::Raw);
        let det = BlinkDetector::new(raw).unwrap();
        assert!(det.detect(&signal).unwrap().is_empty());
    }

    #[test]
    fn test_refractory_merge_keeps_larger_peak() {
        let det = detector();
        let w = det.window_len();
        let half = det.refractory_samples() / 2;
        let first = 2 * w + 20;

        let mut signal = vec![0.0f64; 5 * w];
        signal[first] = 500.0;
        signal[first + half] = 800.0;
        assert_eq!(det.detect(&signal).unwrap(), vec![first + half]);

        signal[first] = 900.0;
        assert_eq!(det.detect(&signal).unwrap(), vec![first]);
    }

    #[test]
    fn test_in_window_excursions_collapse_to_highest() {
        let det = detector();
        let mut signal = vec![0.0f64; 250];
        signal[100] = 3.0;
        signal[110] = 9.0;
        signal[120] = 5.0;
        signal[149] = 4.0;
        assert_eq!(det.detect(&signal).unwrap(), vec![110]);
    }

    #[test]
    fn test_impulse_at_window_boundary() {
        let det = detector();
        let w = det.window_len();

        for boundary in [w, 2 * w, 4 * w] {
            let mut signal = vec![0.0f64; 5 * w];
            signal[boundary] = 1000.0;
            assert_eq!(det.detect(&signal).unwrap(), vec![boundary]);
        }
    }

    #[test]
    fn test_excursion_straddling_boundary_detected_once() {
        let det = detector();
        let w = det.window_len();
        let mut signal = vec![0.0f64; 5 * w];
        let b = 2 * w;
        signal[b - 2] = 200.0;
        signal[b - 1] = 600.0;
        signal[b] = 400.0;
        signal[b + 1] = 100.0;

        let result = det.analyze(&signal).unwrap();
        assert_eq!(result.blinks, vec![b - 1]);
        // Both windows saw a candidate; the merge kept one
        assert_eq!(result.windows[1].candidates, 1);
        assert_eq!(result.windows[2].candidates, 1);
    }

    #[test]
    fn test_peaks_just_beyond_refractory_are_kept() {
        let det = detector();
        let r = det.refractory_samples();
        let mut signal = vec![0.0f64; 250];
        signal[10] = 100.0;
        signal[10 + r] = 100.0;
        signal[10 + 2 * r + 1] = 100.0;

        // Exactly r apart is still inside the refractory period
        assert_eq!(det.detect(&signal).unwrap(), vec![10, 10 + 2 * r + 1]);
    }

    #[test]
    fn test_refractory_counts_from_accepted_peak_only() {
        let det = detector();
        let r = det.refractory_samples();
        let mut signal = vec![0.0f64; 250];
        signal[10] = 100.0;
        signal[10 + r] = 100.0;
        signal[10 + 2 * r] = 100.0;

        // 10 + 2r is exactly r past the suppressed peak, but more than r
        // past the accepted one
        assert_eq!(det.detect(&signal).unwrap(), vec![10, 10 + 2 * r]);
    }

    #[test]
    fn test_refractory_counts_from_accepted_peak_across_windows() {
        let det = detector();
        let w = det.window_len();
        let r = det.refractory_samples();
        let first = w - r - 10;
        let mut signal = vec![0.0f64; 2 * w];
        signal[first] = 100.0;
        signal[first + r] = 100.0;
        signal[first + 2 * r] = 100.0;
        assert!(first + r < w && first + 2 * r >= w);

        let result = det.analyze(&signal).unwrap();
        assert_eq!(result.blinks, vec![first, first + 2 * r]);
        assert_eq!(result.windows[0].candidates, 2);
        assert_eq!(result.windows[1].candidates, 1);
    }

    #[test]
    fn test_huge_refractory_period() {
        let mut signal = vec![0.0f64; 500];
        signal[10] = 100.0;
        signal[300] = 100.0;

        // Fits in usize: one blink suppresses everything after it
        let config = DetectorConfig::new(FS)
            .with_window_seconds(1.0)
            .with_refractory_seconds(1.0e6);
        let det = BlinkDetector::new(config).unwrap();
        assert_eq!(det.detect(&signal).unwrap(), vec![10]);

        // Does not fit in usize
        let config = config.with_refractory_seconds(1.0e300);
        assert!(matches!(
            config.refractory_samples(),
            Err(BlinkError::InvalidParameter {
                name: "refractory_seconds",
                ..
            })
        ));
        assert!(BlinkDetector::new(config).is_err());
        assert!(BlinkDetector::new(DetectorConfig::new(FS).with_window_seconds(1.0e300)).is_err());
    }

    #[test]
    fn test_ragged_tail_window() {
        let det = detector();
        let w = det.window_len();
        let len = 2 * w + 30;
        let mut signal = vec![0.0f64; len];
        signal[2 * w + 12] = 50.0;

        let result = det.analyze(&signal).unwrap();
        assert_eq!(result.blinks, vec![2 * w + 12]);
        assert_eq!(result.windows.len(), 3);
        assert_eq!(result.windows[2].start, 2 * w);
        assert_eq!(result.windows[2].end, len);
    }

    #[test]
    fn test_window_summaries_cover_signal() {
        let det = detector();
        let signal = vec![1.0f64; 1001];
        let result = det.analyze(&signal).unwrap();

        assert_eq!(result.windows.len(), 5);
        assert_eq!(result.windows[0].start, 0);
        for pair in result.windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(result.windows[4].end, 1001);
        assert!(result.windows.iter().all(|w| w.threshold == 1.0));
    }

    #[test]
    fn test_thresholds_adapt_per_window() {
        let det = detector();
        let w = det.window_len();
        let mut signal = vec![0.0f64; 2 * w];
        for (i, s) in signal.iter_mut().enumerate() {
            let base = if i < w { 1.0 } else { 10.0 };
            *s = base + (i % 4) as f64;
        }
        let result = det.analyze(&signal).unwrap();
        assert!(result.windows[1].threshold > result.windows[0].threshold + 8.0);
    }

    #[test]
    fn test_non_finite_sample_rejected() {
        let det = detector();
        let mut signal = vec![0.0f64; 600];
        signal[10] = 1000.0;
        signal[321] = f64::NAN;
        assert_eq!(
            det.detect(&signal),
            Err(BlinkError::NonFiniteSample { index: 321 })
        );

        signal[321] = f64::NEG_INFINITY;
        assert!(det.analyze(&signal).is_err());
    }

    #[test]
    fn test_thresholder_error_propagates() {
        let config = DetectorConfig::new(FS).with_window_seconds(1.0);
        let failing = |_: &[f64], _: f64| -> Result<f64> { Err(BlinkError::EmptyInput) };
        let det = BlinkDetector::with_thresholder(config, failing).unwrap();
        assert_eq!(det.detect(&[1.0f64; 10]), Err(BlinkError::EmptyInput));
    }

    #[test]
    fn test_custom_thresholder() {
        let config = DetectorConfig::new(FS).with_window_seconds(1.0);
        let det = BlinkDetector::with_thresholder(config, QuantileThreshold::new(1.0).unwrap())
            .unwrap();
        // Nothing exceeds the window maximum
        let signal: Vec<f64> = (0..500).map(|i| (i % 37) as f64).collect();
        assert!(det.detect(&signal).unwrap().is_empty());
        assert_eq!(det.thresholder().quantile(), 1.0);
    }

    #[test]
    fn test_detect_blinks_shorthand() {
        let mut signal = vec![0.0f32; 2000];
        signal[300] = 120.0;
        signal[1700] = -90.0;
        assert_eq!(detect_blinks(&signal, FS, 2.0, 5.0).unwrap(), vec![300, 1700]);
        assert!(detect_blinks(&signal, FS, 0.0, 5.0).is_err());
        assert!(detect_blinks(&signal, FS, 2.0, -5.0).is_err());
    }

    #[test]
    fn test_deterministic_and_well_formed_on_synthetic_eeg() {
        let eeg = simulate_eeg_with_blinks(&SynthConfig {
            duration_seconds: 30.0,
            blink_rate: 0.5,
            seed: 11,
            ..SynthConfig::default()
        })
        .unwrap();

        let config = DetectorConfig::new(eeg.sample_rate)
            .with_window_seconds(3.5)
            .with_threshold_multiplier(3.0);
        let det = BlinkDetector::new(config).unwrap();

        let first = det.detect(&eeg.samples).unwrap();
        let second = det.detect(&eeg.samples).unwrap();
        assert_eq!(first, second);
        assert_well_formed(&first, eeg.samples.len(), det.refractory_samples());
    }

    #[test]
    fn test_finds_synthetic_blinks() {
        let eeg = simulate_eeg_with_blinks(&SynthConfig {
            duration_seconds: 30.0,
            sample_rate: 256.0,
            blink_rate: 0.3,
            blink_amplitude: 400.0,
            noise_level: 2.0,
            seed: 42,
        })
        .unwrap();
        assert!(!eeg.blink_positions.is_empty());

        let config = DetectorConfig::new(eeg.sample_rate)
            .with_window_seconds(3.5)
            .with_threshold_multiplier(6.0);
        let det = BlinkDetector::new(config).unwrap();
        let blinks = det.detect(&eeg.samples).unwrap();

        // Half the blink width
        let tolerance = 40;
        let near = |a: usize, b: usize| a.abs_diff(b) <= tolerance;

        assert!(!blinks.is_empty());
        for &b in &blinks {
            assert!(
                eeg.blink_positions.iter().any(|&t| near(t, b)),
                "false alarm at {b}"
            );
        }
        // Blinks closer than the refractory period may merge into a neighbor
        for &t in &eeg.blink_positions {
            let merged = eeg
                .blink_positions
                .iter()
                .any(|&o| o != t && o.abs_diff(t) < 3 * tolerance);
            assert!(
                merged || blinks.iter().any(|&b| near(t, b)),
                "missed blink at {t}"
            );
        }
        assert_well_formed(&blinks, eeg.samples.len(), det.refractory_samples());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let eeg = simulate_eeg_with_blinks(&SynthConfig {
            duration_seconds: 60.0,
            blink_rate: 0.5,
            seed: 3,
            ..SynthConfig::default()
        })
        .unwrap();
        let det = BlinkDetector::new(
            DetectorConfig::new(eeg.sample_rate).with_window_seconds(1.0),
        )
        .unwrap();

        assert_eq!(
            det.analyze(&eeg.samples).unwrap(),
            det.analyze_parallel(&eeg.samples).unwrap()
        );
        assert_eq!(
            det.detect(&eeg.samples).unwrap(),
            det.detect_parallel(&eeg.samples).unwrap()
        );
    }
}
