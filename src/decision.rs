//! Accept/reject decision on the confidence score

/// Minimum confidence score accepted as a match
pub const MATCH_THRESHOLD: f64 = 0.75;

/// Whether a confidence score clears the match threshold
pub fn is_match(confidence_score: f64) -> bool {
    confidence_score >= MATCH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_match(0.75));
        assert!(is_match(1.0));
        assert!(!is_match(0.749_999));
        assert!(!is_match(0.0));
        assert!(!is_match(f64::NAN));
    }
}
