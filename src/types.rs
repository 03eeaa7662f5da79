//! Core data types for Keyprint
//!
//! These types flow through the capture → features → similarity → decision
//! pipeline. Optional pointer fields are real `Option`s on the wire: an absent
//! value is omitted, never written as `0`, because the pointer similarity
//! treats "no pointer data" differently from "measured zero velocity".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of interaction captured during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    KeyDown,
    KeyUp,
    PointerMove,
}

impl InteractionKind {
    /// Whether this kind belongs to the keyboard stream
    pub fn is_key(self) -> bool {
        matches!(self, InteractionKind::KeyDown | InteractionKind::KeyUp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::KeyDown => "key_down",
            InteractionKind::KeyUp => "key_up",
            InteractionKind::PointerMove => "pointer_move",
        }
    }
}

/// A single recorded interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Event time in milliseconds
    pub timestamp_ms: i64,
    /// Event kind
    pub kind: InteractionKind,
    /// Key identifier (key events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Hold duration in milliseconds (key-up events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Pointer x position (pointer events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Pointer y position (pointer events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Pointer velocity in pixels per millisecond (pointer events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
}

impl InteractionEvent {
    pub fn key_down(timestamp_ms: i64, key: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::KeyDown,
            key: Some(key.into()),
            duration_ms: None,
            x: None,
            y: None,
            velocity: None,
        }
    }

    pub fn key_up(timestamp_ms: i64, key: impl Into<String>, duration_ms: i64) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::KeyUp,
            key: Some(key.into()),
            duration_ms: Some(duration_ms),
            x: None,
            y: None,
            velocity: None,
        }
    }

    pub fn pointer_move(timestamp_ms: i64, x: f64, y: f64, velocity: f64) -> Self {
        Self {
            timestamp_ms,
            kind: InteractionKind::PointerMove,
            key: None,
            duration_ms: None,
            x: Some(x),
            y: Some(y),
            velocity: Some(velocity),
        }
    }

    /// Whether this is a correction keystroke (Backspace or Delete)
    pub fn is_correction(&self) -> bool {
        matches!(self.key.as_deref(), Some("Backspace") | Some("Delete"))
    }
}

/// Behavioral features derived from one capture session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralFeatureVector {
    // Key dynamics
    /// Mean key hold duration in milliseconds
    pub avg_key_press_duration: f64,
    /// Mean delay between consecutive key events in milliseconds
    pub avg_inter_key_delay: f64,
    /// Population variance of key hold durations
    pub key_press_variance: f64,
    /// Population variance of inter-key delays
    pub inter_key_variance: f64,

    // Rhythm
    /// Normalized histogram of inter-key delays (sums to 1 or is all zero)
    pub rhythm_histogram: Vec<f64>,
    /// Fraction of inter-key delays under 100ms
    pub burst_typing_rate: f64,
    /// Fraction of inter-key delays over 500ms
    pub pause_frequency: f64,

    // Error patterns
    /// Fraction of key events that are Backspace/Delete
    pub backspace_rate: f64,
    /// Raw delay before each correction keystroke, in milliseconds
    pub correction_timings: Vec<i64>,

    // Pointer dynamics
    /// Mean pointer velocity; absent when the session had no pointer samples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_pointer_velocity: Option<f64>,
    /// Mean absolute change in pointer velocity; absent with pointer velocity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer_acceleration: Option<f64>,

    /// Z-score normalized signature: 9 scalar features followed by the histogram
    pub signature: Vec<f64>,
}

/// Per-category similarity scores, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMetrics {
    pub typing_rhythm: f64,
    pub key_dynamics: f64,
    pub pointer_dynamics: f64,
    pub overall: f64,
}

/// Outcome of comparing a current sample against an enrolled one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_match: bool,
    /// Always equal to `metrics.overall`
    pub confidence_score: f64,
    pub metrics: SimilarityMetrics,
}

/// Reference feature vector stored for an identity at enrollment time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledProfile {
    /// Unique profile identifier (UUID)
    pub profile_id: String,
    /// Identity the profile was enrolled for
    pub user_id: String,
    /// Enrolled features
    pub features: BehavioralFeatureVector,
    /// Enrollment time
    pub enrolled_at: DateTime<Utc>,
    /// Number of capture sessions the profile was built from
    pub sample_count: u32,
}

impl EnrolledProfile {
    /// Wrap a freshly extracted feature vector as a single-sample profile
    pub fn new(user_id: impl Into<String>, features: BehavioralFeatureVector) -> Self {
        Self {
            profile_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            features,
            enrolled_at: Utc::now(),
            sample_count: 1,
        }
    }
}

/// Verification result stamped with the decision context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub result: VerificationResult,
    /// Threshold the decision was made against
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub verified_at: DateTime<Utc>,
}
