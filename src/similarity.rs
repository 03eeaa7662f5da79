//! Similarity engine
//!
//! Compares an enrolled feature vector against a current one across typing
//! rhythm, key dynamics, pointer dynamics and the overall signature. Every
//! score is clamped to `[0, 1]`. Only the overall (signature cosine) score
//! drives the decision; the category scores are informational.

use crate::decision::is_match;
use crate::types::{BehavioralFeatureVector, SimilarityMetrics, VerificationResult};

/// Pointer similarity used when either side has no pointer data
pub const NEUTRAL_POINTER_SIMILARITY: f64 = 0.7;

/// Score `current` against `enrolled`
pub fn score(
    enrolled: &BehavioralFeatureVector,
    current: &BehavioralFeatureVector,
) -> VerificationResult {
    let metrics = SimilarityMetrics {
        typing_rhythm: typing_rhythm_similarity(enrolled, current),
        key_dynamics: key_dynamics_similarity(enrolled, current),
        pointer_dynamics: pointer_dynamics_similarity(enrolled, current),
        overall: overall_similarity(&enrolled.signature, &current.signature),
    };

    let confidence_score = metrics.overall;
    VerificationResult {
        is_match: is_match(confidence_score),
        confidence_score,
        metrics,
    }
}

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`.
///
/// Returns `0` when the lengths differ or either norm is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    // Normalize by the largest magnitude so the squares neither overflow nor
    // underflow.
    let (Some(scale_a), Some(scale_b)) = (max_magnitude(a), max_magnitude(b)) else {
        return 0.0;
    };

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x / scale_a, y / scale_b))
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let cosine = dot / denominator;
    if cosine.is_finite() {
        cosine
    } else {
        0.0
    }
}

/// Typing rhythm: histogram shape, burst rate and pause frequency
pub fn typing_rhythm_similarity(
    enrolled: &BehavioralFeatureVector,
    current: &BehavioralFeatureVector,
) -> f64 {
    let rhythm = cosine_similarity(&enrolled.rhythm_histogram, &current.rhythm_histogram);
    let burst = difference_similarity(enrolled.burst_typing_rate, current.burst_typing_rate);
    let pause = difference_similarity(enrolled.pause_frequency, current.pause_frequency);

    clamp_unit(0.5 * rhythm + 0.3 * burst + 0.2 * pause)
}

/// Key dynamics: hold duration, inter-key delay, hold variance and error rate
pub fn key_dynamics_similarity(
    enrolled: &BehavioralFeatureVector,
    current: &BehavioralFeatureVector,
) -> f64 {
    let duration = ratio_similarity(
        enrolled.avg_key_press_duration,
        current.avg_key_press_duration,
    );
    let delay = ratio_similarity(enrolled.avg_inter_key_delay, current.avg_inter_key_delay);
    let variance = ratio_similarity(enrolled.key_press_variance, current.key_press_variance);
    let backspace = difference_similarity(enrolled.backspace_rate, current.backspace_rate);

    clamp_unit(0.3 * duration + 0.3 * delay + 0.2 * variance + 0.2 * backspace)
}

/// Pointer dynamics: velocity and acceleration.
///
/// Pointer data is optional; a text-only session on either side scores the
/// neutral constant instead of being penalized.
pub fn pointer_dynamics_similarity(
    enrolled: &BehavioralFeatureVector,
    current: &BehavioralFeatureVector,
) -> f64 {
    let (Some(enrolled_velocity), Some(current_velocity)) =
        (enrolled.avg_pointer_velocity, current.avg_pointer_velocity)
    else {
        return NEUTRAL_POINTER_SIMILARITY;
    };

    let velocity = ratio_similarity(enrolled_velocity, current_velocity);
    let acceleration = ratio_similarity(
        enrolled.pointer_acceleration.unwrap_or(0.0),
        current.pointer_acceleration.unwrap_or(0.0),
    );

    clamp_unit(0.6 * velocity + 0.4 * acceleration)
}

/// Overall similarity: cosine of the two signatures, clamped to `[0, 1]`
pub fn overall_similarity(enrolled: &[f64], current: &[f64]) -> f64 {
    clamp_unit(cosine_similarity(enrolled, current))
}

/// Ratio rule for a pair of magnitudes: `1` when both are zero, otherwise
/// `1 - min(|e - c| / max(e, c), 1)`.
pub fn ratio_similarity(enrolled: f64, current: f64) -> f64 {
    if enrolled == 0.0 && current == 0.0 {
        return 1.0;
    }
    let largest = enrolled.max(current);
    // Magnitudes are never negative in extracted vectors; a non-positive
    // maximum has no scale to compare against.
    if largest <= 0.0 {
        return 1.0;
    }
    let relative = (enrolled - current).abs() / largest;
    if relative.is_nan() {
        return 0.0;
    }
    clamp_unit(1.0 - relative.min(1.0))
}

/// Absolute-difference rule for rates: `1 - min(|e - c|, 1)`
pub fn difference_similarity(enrolled: f64, current: f64) -> f64 {
    let diff = (enrolled - current).abs();
    if diff.is_nan() {
        return 0.0;
    }
    clamp_unit(1.0 - diff.min(1.0))
}

/// Largest absolute component, `None` for an empty, all-zero or non-finite
/// vector
fn max_magnitude(values: &[f64]) -> Option<f64> {
    let largest = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    (largest > 0.0 && largest.is_finite()).then_some(largest)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
