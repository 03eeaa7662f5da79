//! Pipeline orchestration
//!
//! This module provides the public API for enrollment and verification.
//! It orchestrates the full pipeline from a raw interaction stream to a
//! feature vector (enrollment) or a verification result (verification).
//!
//! Pipeline: Raw interactions → Capture session → Features → Similarity → Decision

use crate::decision::MATCH_THRESHOLD;
use crate::error::ComputeError;
use crate::features::FeatureExtractor;
use crate::schema::{InteractionAdapter, RawInteraction};
use crate::similarity;
use crate::types::{
    BehavioralFeatureVector, EnrolledProfile, VerificationReport, VerificationResult,
};
use chrono::Utc;
use tracing::info;

/// Derive the feature vector of one recorded interaction stream
pub fn extract_features(events: &[RawInteraction]) -> BehavioralFeatureVector {
    let session = InteractionAdapter::replay(events);
    FeatureExtractor::extract(&session)
}

/// Build an enrolled profile for `user_id` from one interaction stream
pub fn enroll(user_id: &str, events: &[RawInteraction]) -> EnrolledProfile {
    let profile = EnrolledProfile::new(user_id, extract_features(events));
    info!(
        user_id,
        profile_id = %profile.profile_id,
        events = events.len(),
        "enrolled profile"
    );
    profile
}

/// Verify an interaction stream against an enrolled profile
pub fn verify(profile: &EnrolledProfile, events: &[RawInteraction]) -> VerificationResult {
    verify_report(profile, &extract_features(events)).result
}

/// Verify a feature vector against an enrolled profile, stamping the
/// decision context
pub fn verify_report(
    profile: &EnrolledProfile,
    current: &BehavioralFeatureVector,
) -> VerificationReport {
    let result = similarity::score(&profile.features, current);
    info!(
        user_id = %profile.user_id,
        confidence = result.confidence_score,
        is_match = result.is_match,
        "verified sample"
    );

    VerificationReport {
        result,
        threshold: MATCH_THRESHOLD,
        profile_id: Some(profile.profile_id.clone()),
        user_id: Some(profile.user_id.clone()),
        verified_at: Utc::now(),
    }
}

/// Score several samples against one enrolled feature vector
pub fn batch_verify(
    enrolled: &BehavioralFeatureVector,
    samples: &[BehavioralFeatureVector],
) -> Vec<VerificationResult> {
    samples
        .iter()
        .map(|sample| similarity::score(enrolled, sample))
        .collect()
}

/// Parse interactions given either as a JSON array or as NDJSON
pub fn parse_interactions(input: &str) -> Result<Vec<RawInteraction>, ComputeError> {
    if input.trim_start().starts_with('[') {
        InteractionAdapter::parse_array(input)
    } else {
        InteractionAdapter::parse_ndjson(input)
    }
}

/// Parse an enrolled profile from JSON
pub fn parse_profile(json: &str) -> Result<EnrolledProfile, ComputeError> {
    let profile: EnrolledProfile =
        serde_json::from_str(json).map_err(|e| ComputeError::InvalidProfile(e.to_string()))?;
    if profile.user_id.is_empty() {
        return Err(ComputeError::InvalidProfile(
            "user_id must not be empty".to_string(),
        ));
    }
    Ok(profile)
}

/// Convert an interaction stream (JSON array or NDJSON) to feature vector JSON
pub fn events_to_features_json(events_json: &str) -> Result<String, ComputeError> {
    let events = parse_interactions(events_json)?;
    let features = extract_features(&events);
    serde_json::to_string(&features).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Enroll from an interaction stream and return the profile as JSON
pub fn enroll_json(user_id: &str, events_json: &str) -> Result<String, ComputeError> {
    let events = parse_interactions(events_json)?;
    let profile = enroll(user_id, &events);
    serde_json::to_string(&profile).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Verify an interaction stream against a profile and return the report as JSON
pub fn verify_json(profile_json: &str, events_json: &str) -> Result<String, ComputeError> {
    let profile = parse_profile(profile_json)?;
    let events = parse_interactions(events_json)?;
    let report = verify_report(&profile, &extract_features(&events));
    serde_json::to_string(&report).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// "hello" typed with steady rhythm, plus a short pointer drag
    fn typing_sample(offset: i64, hold: i64, gap: i64) -> Vec<RawInteraction> {
        let mut events = Vec::new();
        let mut t = offset;
        for key in ["h", "e", "l", "l", "o"] {
            events.push(RawInteraction::key_down(t, key));
            events.push(RawInteraction::key_up(t + hold, key));
            t += hold + gap;
        }
        for i in 0..5 {
            events.push(RawInteraction::pointer_move(t + i * 16, i as f64 * 8.0, 4.0));
        }
        events
    }

    #[test]
    fn test_enroll_then_verify_same_rhythm() {
        let profile = enroll("student-1", &typing_sample(0, 90, 60));
        let result = verify(&profile, &typing_sample(10_000, 90, 60));

        assert!(result.is_match);
        assert!((result.confidence_score - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence_score, result.metrics.overall);
    }

    #[test]
    fn test_verify_report_carries_context() {
        let profile = enroll("student-1", &typing_sample(0, 90, 60));
        let report = verify_report(&profile, &profile.features);

        assert_eq!(report.threshold, 0.75);
        assert_eq!(report.user_id.as_deref(), Some("student-1"));
        assert_eq!(report.profile_id, Some(profile.profile_id.clone()));
    }

    #[test]
    fn test_batch_verify_preserves_order() {
        let enrolled = extract_features(&typing_sample(0, 90, 60));
        let mut orthogonal = enrolled.clone();
        orthogonal.signature = vec![0.0; enrolled.signature.len()];

        let results = batch_verify(&enrolled, &[enrolled.clone(), orthogonal]);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_match);
        assert!(!results[1].is_match);
        assert_eq!(results[1].confidence_score, 0.0);
    }

    #[test]
    fn test_parse_interactions_detects_format() {
        let array = r#"[{"timestamp_ms": 0, "kind": "key_down", "key": "a"}]"#;
        let ndjson = "{\"timestamp_ms\": 0, \"kind\": \"key_down\", \"key\": \"a\"}\n";
        assert_eq!(
            parse_interactions(array).unwrap(),
            parse_interactions(ndjson).unwrap()
        );
    }

    #[test]
    fn test_parse_profile_rejects_empty_user() {
        let mut profile = enroll("someone", &typing_sample(0, 90, 60));
        profile.user_id.clear();
        let json = serde_json::to_string(&profile).unwrap();

        assert!(matches!(
            parse_profile(&json),
            Err(ComputeError::InvalidProfile(_))
        ));
        assert!(matches!(
            parse_profile("{}"),
            Err(ComputeError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_verify_json_round_trip() {
        let events_json = serde_json::to_string(&typing_sample(0, 90, 60)).unwrap();
        let profile_json = enroll_json("student-7", &events_json).unwrap();
        let report_json = verify_json(&profile_json, &events_json).unwrap();

        let report: serde_json::Value = serde_json::from_str(&report_json).unwrap();
        assert_eq!(report["result"]["is_match"], true);
        assert_eq!(report["user_id"], "student-7");
        assert_eq!(report["threshold"], 0.75);
    }

    #[test]
    fn test_events_to_features_json_text_only() {
        let events = r#"[
            {"timestamp_ms": 0, "kind": "key_down", "key": "a"},
            {"timestamp_ms": 70, "kind": "key_up", "key": "a"}
        ]"#;
        let json = events_to_features_json(events).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["avg_key_press_duration"], 70.0);
        assert!(value.get("avg_pointer_velocity").is_none());
        assert_eq!(value["signature"].as_array().unwrap().len(), 19);
    }

    #[test]
    fn test_invalid_events_json() {
        assert!(events_to_features_json("[not json").is_err());
        assert!(verify_json("{}", "[]").is_err());
    }
}
