//! Smoothing helpers for the ball midpoint series.
//!
//! The detector's box jitters a few pixels from frame to frame, which would
//! otherwise show up as spurious direction changes. A short trailing mean
//! removes most of it while adding only a couple of frames of latency.

/// Number of samples in the trailing mean window.
pub const SMOOTHING_WINDOW: usize = 5;

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Smooth a midpoint series with the fixed trailing window.
///
/// Output has the same length as the input.
pub fn smooth(series: &[f64]) -> Vec<f64> {
    trailing_mean(series, SMOOTHING_WINDOW)
}

/// Trailing rolling mean: element `i` is the mean of `series[i + 1 - window ..= i]`.
///
/// The first `window - 1` outputs average over the shorter prefix that is
/// available. There is no look-ahead.
pub fn trailing_mean(series: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return series.to_vec();
    }

    (0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&series[start..=i])
        })
        .collect()
}

/// First differences `out[i] = series[i] - series[i - 1]`.
///
/// `out[0]` has no predecessor and is always `0.0`; callers must not treat
/// it as a direction.
pub fn first_differences(series: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    if series.is_empty() {
        return out;
    }
    out.push(0.0);
    out.extend(series.windows(2).map(|pair| pair[1] - pair[0]));
    out
}
