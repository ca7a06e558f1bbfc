//! Scoring and export helpers shared by the demos.
//!
//! - Event matching against ground truth (hits, misses, false alarms)
//! - CSV export of a detection run
//! - PNG plot of the signal, per-window thresholds and detected blinks

#![allow(dead_code)] // Not every demo uses every helper

use blinkstone::{Detection, Rectification};
use plotters::prelude::*;
use std::error::Error;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Outcome of matching detections against known events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventScore {
    /// Ground-truth events with a detection within tolerance
    pub hits: usize,
    /// Ground-truth events nobody claimed
    pub misses: usize,
    /// Detections not matched to any event
    pub false_alarms: usize,
}

impl EventScore {
    /// Fraction of true events that were found.
    pub fn recall(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 1.0;
        }
        self.hits as f64 / total as f64
    }

    /// Fraction of detections that correspond to a true event.
    pub fn precision(&self) -> f64 {
        let total = self.hits + self.false_alarms;
        if total == 0 {
            return 1.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Greedily pairs each true event with the closest unclaimed detection no
/// more than `tolerance` samples away.
///
/// Both slices must be ascending.
pub fn match_events(truth: &[usize], detected: &[usize], tolerance: usize) -> EventScore {
    let mut claimed = vec![false; detected.len()];
    let mut score = EventScore::default();

    for &event in truth {
        let best = detected
            .iter()
            .enumerate()
            .filter(|&(i, &d)| !claimed[i] && d.abs_diff(event) <= tolerance)
            .min_by_key(|&(_, &d)| d.abs_diff(event));

        match best {
            Some((i, _)) => {
                claimed[i] = true;
                score.hits += 1;
            }
            None => score.misses += 1,
        }
    }

    score.false_alarms = claimed.iter().filter(|&&c| !c).count();
    score
}

/// Threshold applied at each sample, taken from the window containing it.
pub fn threshold_per_sample(detection: &Detection, len: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; len];
    for window in &detection.windows {
        let end = window.end.min(len);
        for slot in &mut out[window.start..end] {
            *slot = window.threshold;
        }
    }
    out
}

/// Writes one row per sample:
/// `sample,time_s,raw,rectified,threshold,blink`.
pub fn write_csv(
    path: &str,
    signal: &[f64],
    sample_rate: f64,
    rectification: Rectification,
    detection: &Detection,
) -> Result<(), Box<dyn Error>> {
    ensure_parent(path)?;
    let mut file = BufWriter::new(fs::File::create(path)?);

    let thresholds = threshold_per_sample(detection, signal.len());
    let mut blinks = detection.blinks.iter().peekable();

    writeln!(file, "sample,time_s,raw,rectified,threshold,blink")?;
    for (i, (&x, &th)) in signal.iter().zip(&thresholds).enumerate() {
        let is_blink = blinks.next_if_eq(&&i).is_some();
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{}",
            i,
            i as f64 / sample_rate,
            x,
            rectification.apply(x),
            th,
            u8::from(is_blink)
        )?;
    }

    file.flush()?;
    Ok(())
}

/// Plots the rectified signal, each window's threshold as a flat segment and
/// a marker on every detected blink. True blinks, when given, are drawn as
/// hollow circles.
pub fn plot_detection(
    path: &str,
    signal: &[f64],
    sample_rate: f64,
    rectification: Rectification,
    detection: &Detection,
    truth: &[usize],
) -> Result<(), Box<dyn Error>> {
    if signal.is_empty() {
        return Err("nothing to plot: empty signal".into());
    }
    ensure_parent(path)?;

    let rectified: Vec<f64> = signal.iter().map(|&x| rectification.apply(x)).collect();
    let time = |i: usize| i as f64 / sample_rate;

    let mut y_min = rectified.iter().copied().fold(f64::INFINITY, f64::min);
    let mut y_max = rectified.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for window in &detection.windows {
        y_max = y_max.max(window.threshold);
    }
    let margin = ((y_max - y_min) * 0.1).max(1e-6);
    y_min -= margin;
    y_max += margin;

    let root = BitMapBackend::new(path, (1400, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Blink detection ({} found)", detection.blinks.len()),
            ("sans-serif", 22),
        )
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..time(signal.len() - 1).max(1e-6), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Amplitude (µV)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            rectified.iter().enumerate().map(|(i, &v)| (time(i), v)),
            BLUE.stroke_width(1),
        ))?
        .label("signal")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(detection.windows.iter().map(|w| {
            PathElement::new(
                vec![
                    (time(w.start), w.threshold),
                    (time(w.end - 1), w.threshold),
                ],
                RED.stroke_width(2),
            )
        }))?
        .label("threshold")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .draw_series(
            detection
                .blinks
                .iter()
                .map(|&i| TriangleMarker::new((time(i), rectified[i]), 7, GREEN.filled())),
        )?
        .label("detected")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 5, GREEN.filled()));

    if !truth.is_empty() {
        chart
            .draw_series(
                truth
                    .iter()
                    .filter(|&&i| i < rectified.len())
                    .map(|&i| Circle::new((time(i), rectified[i]), 6, BLACK.stroke_width(1))),
            )?
            .label("true blink")
            .legend(|(x, y)| Circle::new((x + 10, y), 4, BLACK.stroke_width(1)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn ensure_parent(path: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
