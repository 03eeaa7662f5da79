//! Randomized invariants over the similarity engine and feature extractor,
//! driven by a fixed seed so failures reproduce.

use keyprint::features::{HISTOGRAM_BINS, SIGNATURE_LEN};
use keyprint::similarity::NEUTRAL_POINTER_SIMILARITY;
use keyprint::{cosine_similarity, score, BehavioralFeatureVector, CaptureSession};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROUNDS: usize = 200;

fn random_vector(rng: &mut StdRng, len: usize, scale: f64) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-scale..scale)).collect()
}

fn random_features(rng: &mut StdRng, scale: f64, with_pointer: bool) -> BehavioralFeatureVector {
    BehavioralFeatureVector {
        avg_key_press_duration: rng.gen_range(-scale..scale),
        avg_inter_key_delay: rng.gen_range(-scale..scale),
        key_press_variance: rng.gen_range(-scale..scale),
        inter_key_variance: rng.gen_range(-scale..scale),
        rhythm_histogram: random_vector(rng, HISTOGRAM_BINS, scale),
        burst_typing_rate: rng.gen_range(-scale..scale),
        pause_frequency: rng.gen_range(-scale..scale),
        backspace_rate: rng.gen_range(-scale..scale),
        correction_timings: Vec::new(),
        avg_pointer_velocity: with_pointer.then(|| rng.gen_range(-scale..scale)),
        pointer_acceleration: with_pointer.then(|| rng.gen_range(-scale..scale)),
        signature: random_vector(rng, SIGNATURE_LEN, scale),
    }
}

fn in_unit(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

#[test]
fn cosine_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..ROUNDS {
        let a = random_vector(&mut rng, SIGNATURE_LEN, 50.0);
        let b = random_vector(&mut rng, SIGNATURE_LEN, 50.0);
        let ab = cosine_similarity(&a, &b);
        let ba = cosine_similarity(&b, &a);
        assert!((ab - ba).abs() < 1e-12, "{ab} != {ba}");
        assert!((-1.0 - 1e-12..=1.0 + 1e-12).contains(&ab));
    }
}

#[test]
fn cosine_with_self_is_one() {
    let mut rng = StdRng::seed_from_u64(11);
    for scale in [1e-200, 1e-6, 1e3, 1e200] {
        for _ in 0..ROUNDS {
            let a = random_vector(&mut rng, SIGNATURE_LEN, scale);
            let cosine = cosine_similarity(&a, &a);
            assert!((cosine - 1.0).abs() < 1e-9, "cos(a, a) = {cosine} at scale {scale}");
        }
    }
}

#[test]
fn cosine_degenerate_inputs_are_zero() {
    let zeros = vec![0.0; SIGNATURE_LEN];
    let ones = vec![1.0; SIGNATURE_LEN];
    assert_eq!(cosine_similarity(&zeros, &ones), 0.0);
    assert_eq!(cosine_similarity(&ones[..5], &ones), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
}

#[test]
fn every_metric_stays_in_unit_interval() {
    let mut rng = StdRng::seed_from_u64(23);
    for scale in [1e-6, 1.0, 1e3, 1e12] {
        for round in 0..ROUNDS {
            let enrolled = random_features(&mut rng, scale, round % 2 == 0);
            let current = random_features(&mut rng, scale, round % 3 == 0);
            let result = score(&enrolled, &current);

            assert!(in_unit(result.metrics.typing_rhythm));
            assert!(in_unit(result.metrics.key_dynamics));
            assert!(in_unit(result.metrics.pointer_dynamics));
            assert!(in_unit(result.metrics.overall));
            assert_eq!(result.confidence_score, result.metrics.overall);
            assert_eq!(result.is_match, result.confidence_score >= 0.75);
        }
    }
}

#[test]
fn all_zero_vectors_stay_in_unit_interval() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut zero = random_features(&mut rng, 1.0, true);
    zero.avg_key_press_duration = 0.0;
    zero.avg_inter_key_delay = 0.0;
    zero.key_press_variance = 0.0;
    zero.inter_key_variance = 0.0;
    zero.rhythm_histogram = vec![0.0; HISTOGRAM_BINS];
    zero.burst_typing_rate = 0.0;
    zero.pause_frequency = 0.0;
    zero.backspace_rate = 0.0;
    zero.avg_pointer_velocity = Some(0.0);
    zero.pointer_acceleration = Some(0.0);
    zero.signature = vec![0.0; SIGNATURE_LEN];

    let result = score(&zero, &zero);
    assert!((result.metrics.key_dynamics - 1.0).abs() < 1e-12);
    assert!((result.metrics.pointer_dynamics - 1.0).abs() < 1e-12);
    assert_eq!(result.metrics.overall, 0.0);
    assert!(!result.is_match);
    assert!(in_unit(result.metrics.typing_rhythm));
}

#[test]
fn missing_pointer_data_scores_neutral() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..ROUNDS {
        let with_pointer = random_features(&mut rng, 100.0, true);
        let without_pointer = random_features(&mut rng, 100.0, false);

        assert_eq!(
            score(&with_pointer, &without_pointer).metrics.pointer_dynamics,
            NEUTRAL_POINTER_SIMILARITY
        );
        assert_eq!(
            score(&without_pointer, &with_pointer).metrics.pointer_dynamics,
            NEUTRAL_POINTER_SIMILARITY
        );
    }
}

#[test]
fn extracted_vectors_hold_their_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    let keys = ["a", "s", "d", "f", "Backspace", "Delete", "j", "k"];

    for _ in 0..ROUNDS {
        let mut session = CaptureSession::new();
        session.start();
        let mut t: i64 = rng.gen_range(0..10_000);
        for _ in 0..rng.gen_range(0..60) {
            let key = keys[rng.gen_range(0..keys.len())];
            match rng.gen_range(0..3) {
                0 => session.record_key_down(key, t),
                1 => session.record_key_up(key, t),
                _ => session.record_pointer_move(
                    rng.gen_range(-500.0..500.0),
                    rng.gen_range(-500.0..500.0),
                    t,
                ),
            }
            t += rng.gen_range(0..2_500);
        }
        session.stop();

        let features = session.into_features();
        let histogram_sum: f64 = features.rhythm_histogram.iter().sum();
        assert_eq!(features.rhythm_histogram.len(), HISTOGRAM_BINS);
        assert!(
            histogram_sum == 0.0 || (histogram_sum - 1.0).abs() < 1e-9,
            "histogram sums to {histogram_sum}"
        );
        assert_eq!(features.signature.len(), SIGNATURE_LEN);
        assert!(features.signature.iter().all(|v| v.is_finite()));
        assert!(in_unit(features.burst_typing_rate));
        assert!(in_unit(features.pause_frequency));
        assert!(in_unit(features.backspace_rate));
        if let Some(velocity) = features.avg_pointer_velocity {
            assert!(velocity.is_finite() && velocity >= 0.0);
            assert!(features.pointer_acceleration.is_some());
        } else {
            assert!(features.pointer_acceleration.is_none());
        }
    }
}
