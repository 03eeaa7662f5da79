//! keyprint.interaction.v1 schema definition
//!
//! One record per host input event. Key events carry the key identifier,
//! pointer events carry the position. Durations and velocities are derived by
//! the capture session, never supplied by the producer.

use crate::types::InteractionKind;
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "keyprint.interaction.v1";

/// A raw input event as delivered by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInteraction {
    /// Event time in milliseconds
    pub timestamp_ms: i64,
    /// Event kind
    pub kind: InteractionKind,
    /// Key identifier (required for key events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Pointer x position (required for pointer events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Pointer y position (required for pointer events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl RawInteraction {
    pub fn key_down(timestamp_ms: i64, key: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::KeyDown,
            key: Some(key.into()),
            x: None,
            y: None,
        }
    }

    pub fn key_up(timestamp_ms: i64, key: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::KeyUp,
            key: Some(key.into()),
            x: None,
            y: None,
        }
    }

    pub fn pointer_move(timestamp_ms: i64, x: f64, y: f64) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::PointerMove,
            key: None,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Check the record on its own. Ordering across records is checked by
    /// [`InteractionAdapter::validate_events`](super::InteractionAdapter::validate_events).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp_ms < 0 {
            return Err(ValidationError::NegativeTimestamp(self.timestamp_ms));
        }

        match self.kind {
            InteractionKind::KeyDown | InteractionKind::KeyUp => match self.key.as_deref() {
                Some(key) if !key.is_empty() => Ok(()),
                _ => Err(ValidationError::MissingKey {
                    kind: self.kind.as_str().to_string(),
                }),
            },
            InteractionKind::PointerMove => match (self.x, self.y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(()),
                (Some(_), Some(_)) => Err(ValidationError::NonFinitePosition),
                _ => Err(ValidationError::MissingPosition),
            },
        }
    }
}

/// Diagnostics for raw interactions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Negative timestamp: {0}")]
    NegativeTimestamp(i64),

    #[error("{kind} event has no key identifier")]
    MissingKey { kind: String },

    #[error("pointer_move event is missing x or y")]
    MissingPosition,

    #[error("pointer_move event has a non-finite position")]
    NonFinitePosition,

    #[error("Timestamp {current} is earlier than the preceding {previous}")]
    OutOfOrder { previous: i64, current: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_key_event() {
        let json = r#"{"timestamp_ms": 1200, "kind": "key_down", "key": "a"}"#;
        let event: RawInteraction = serde_json::from_str(json).unwrap();
        assert_eq!(event, RawInteraction::key_down(1200, "a"));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_deserialize_pointer_event() {
        let json = r#"{"timestamp_ms": 40, "kind": "pointer_move", "x": 10.5, "y": 3.0}"#;
        let event: RawInteraction = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, InteractionKind::PointerMove);
        assert_eq!(event.x, Some(10.5));
        assert!(event.key.is_none());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let json = serde_json::to_value(RawInteraction::key_up(5, "Enter")).unwrap();
        assert!(json.get("x").is_none());
        assert_eq!(json["kind"], "key_up");
    }

    #[test]
    fn test_validation() {
        let mut missing_key = RawInteraction::key_down(10, "a");
        missing_key.key = None;
        assert_eq!(
            missing_key.validate(),
            Err(ValidationError::MissingKey {
                kind: "key_down".to_string()
            })
        );

        let mut missing_y = RawInteraction::pointer_move(10, 1.0, 1.0);
        missing_y.y = None;
        assert_eq!(missing_y.validate(), Err(ValidationError::MissingPosition));

        let nan = RawInteraction::pointer_move(10, f64::NAN, 1.0);
        assert_eq!(nan.validate(), Err(ValidationError::NonFinitePosition));

        let negative = RawInteraction::key_down(-1, "a");
        assert_eq!(negative.validate(), Err(ValidationError::NegativeTimestamp(-1)));
    }
}
