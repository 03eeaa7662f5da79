//! Behavioral feature extraction
//!
//! Derives timing statistics, the rhythm histogram, error-pattern statistics
//! and pointer kinematics from a finished capture session, then builds the
//! normalized signature used for the overall similarity score.
//!
//! Every statistic degrades to `0` on sparse input; extraction never fails and
//! never produces NaN or infinity.

use crate::capture::CaptureSession;
use crate::types::{BehavioralFeatureVector, InteractionEvent, InteractionKind};
use tracing::debug;

/// Number of bins in the rhythm histogram
pub const HISTOGRAM_BINS: usize = 10;

/// Number of scalar features at the head of the signature
pub const SCALAR_FEATURES: usize = 9;

/// Signature length: scalar features followed by the histogram bins
pub const SIGNATURE_LEN: usize = SCALAR_FEATURES + HISTOGRAM_BINS;

/// Key holds at or above this are treated as sensor noise (ms)
const MAX_KEY_PRESS_MS: f64 = 1000.0;

/// Inter-key delays at or above this are not part of the typing rhythm (ms)
const MAX_INTER_KEY_DELAY_MS: f64 = 2000.0;

/// Delays below this count as burst typing (ms)
const BURST_DELAY_MS: f64 = 100.0;

/// Delays above this count as pauses (ms)
const PAUSE_DELAY_MS: f64 = 500.0;

/// Feature extractor for capture sessions
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Derive the feature vector of a capture session
    pub fn extract(session: &CaptureSession) -> BehavioralFeatureVector {
        Self::from_events(session.events())
    }

    /// Derive a feature vector from events in recording order
    pub fn from_events(events: &[InteractionEvent]) -> BehavioralFeatureVector {
        let key_events: Vec<&InteractionEvent> =
            events.iter().filter(|e| e.kind.is_key()).collect();
        let pointer_events: Vec<&InteractionEvent> = events
            .iter()
            .filter(|e| e.kind == InteractionKind::PointerMove)
            .collect();

        // Key press durations
        let durations: Vec<f64> = key_events
            .iter()
            .filter(|e| e.kind == InteractionKind::KeyUp)
            .filter_map(|e| e.duration_ms)
            .map(|d| d as f64)
            .filter(|&d| d > 0.0 && d < MAX_KEY_PRESS_MS)
            .collect();
        let avg_key_press_duration = mean(&durations);
        let key_press_variance = population_variance(&durations);

        // Inter-key delays
        let delays = inter_key_delays(&key_events);
        let avg_inter_key_delay = mean(&delays);
        let inter_key_variance = population_variance(&delays);

        let rhythm_histogram = rhythm_histogram(&delays, HISTOGRAM_BINS);
        let burst_typing_rate = fraction(
            delays.iter().filter(|&&d| d < BURST_DELAY_MS).count(),
            delays.len(),
        );
        let pause_frequency = fraction(
            delays.iter().filter(|&&d| d > PAUSE_DELAY_MS).count(),
            delays.len(),
        );

        // Error patterns
        let backspace_rate = fraction(
            key_events.iter().filter(|e| e.is_correction()).count(),
            key_events.len(),
        );
        let correction_timings = correction_timings(&key_events);

        // Pointer dynamics
        let velocities: Vec<f64> = pointer_events
            .iter()
            .filter_map(|e| e.velocity)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .collect();
        let avg_pointer_velocity = if velocities.is_empty() {
            None
        } else {
            Some(mean(&velocities))
        };
        let pointer_acceleration = avg_pointer_velocity.map(|_| mean_abs_change(&velocities));

        let mut raw = Vec::with_capacity(SIGNATURE_LEN);
        raw.extend_from_slice(&[
            avg_key_press_duration,
            avg_inter_key_delay,
            key_press_variance,
            inter_key_variance,
            burst_typing_rate,
            pause_frequency,
            backspace_rate,
            avg_pointer_velocity.unwrap_or(0.0),
            pointer_acceleration.unwrap_or(0.0),
        ]);
        raw.extend_from_slice(&rhythm_histogram);
        let signature = z_score_normalize(&raw);

        debug!(
            key_events = key_events.len(),
            pointer_samples = velocities.len(),
            delay_samples = delays.len(),
            "extracted feature vector"
        );

        BehavioralFeatureVector {
            avg_key_press_duration,
            avg_inter_key_delay,
            key_press_variance,
            inter_key_variance,
            rhythm_histogram,
            burst_typing_rate,
            pause_frequency,
            backspace_rate,
            correction_timings,
            avg_pointer_velocity,
            pointer_acceleration,
            signature,
        }
    }
}

/// Delays between adjacent key events, kept when inside `(0, 2000)` ms
fn inter_key_delays(key_events: &[&InteractionEvent]) -> Vec<f64> {
    key_events
        .windows(2)
        .map(|pair| pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms) as f64)
        .filter(|&d| d > 0.0 && d < MAX_INTER_KEY_DELAY_MS)
        .collect()
}

/// Raw delay preceding each Backspace/Delete key event
fn correction_timings(key_events: &[&InteractionEvent]) -> Vec<i64> {
    key_events
        .windows(2)
        .filter(|pair| pair[1].is_correction())
        .map(|pair| pair[1].timestamp_ms.saturating_sub(pair[0].timestamp_ms))
        .collect()
}

/// Arithmetic mean, `0` when empty
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, `0` when empty
pub(crate) fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

/// Mean absolute difference between consecutive samples.
///
/// Needs at least two differences; anything shorter gives `0`.
fn mean_abs_change(samples: &[f64]) -> f64 {
    let changes: Vec<f64> = samples
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).abs())
        .collect();
    if changes.len() < 2 {
        return 0.0;
    }
    mean(&changes)
}

/// Equal-width histogram over `[min, max]` of `values`, normalized by sample
/// count. The last bin is closed so the maximum lands in it. When every value
/// is identical the range is empty and all samples land in the first bin.
pub(crate) fn rhythm_histogram(values: &[f64], bins: usize) -> Vec<f64> {
    let mut histogram = vec![0.0; bins];
    if values.is_empty() || bins == 0 {
        return histogram;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    for &value in values {
        let index = if width > 0.0 {
            (((value - min) / width).floor() as usize).min(bins - 1)
        } else {
            0
        };
        histogram[index] += 1.0;
    }

    let total = values.len() as f64;
    histogram.iter_mut().for_each(|count| *count /= total);
    histogram
}

/// Z-score normalize a vector against its own mean and population standard
/// deviation. A zero (or non-finite) deviation maps every element to `0`.
pub(crate) fn z_score_normalize(values: &[f64]) -> Vec<f64> {
    let mu = mean(values);
    let sigma = population_variance(values).sqrt();
    if sigma == 0.0 || !sigma.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - mu) / sigma).collect()
}
