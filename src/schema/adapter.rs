//! Adapter from raw interaction streams to capture sessions
//!
//! Parses JSON arrays and NDJSON streams of raw interactions and replays them
//! through a fresh capture session.

use crate::capture::CaptureSession;
use crate::error::ComputeError;
use crate::schema::raw_interaction::*;
use crate::types::InteractionKind;
use tracing::debug;

/// Adapter for raw interaction streams
pub struct InteractionAdapter;

impl InteractionAdapter {
    /// Parse a JSON string containing an array of RawInteractions
    pub fn parse_array(json: &str) -> Result<Vec<RawInteraction>, ComputeError> {
        let events: Vec<RawInteraction> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawInteractions
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawInteraction>, ComputeError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawInteraction>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(events)
    }

    /// Replay a stream through a new capture session and return it stopped.
    ///
    /// Replay is lenient: records the session cannot use (a key event with no
    /// key, a pointer move with no position) are skipped, and ordering is
    /// taken as given.
    pub fn replay(events: &[RawInteraction]) -> CaptureSession {
        let mut session = CaptureSession::new();
        session.start();

        for event in events {
            match (event.kind, event.key.as_deref(), event.x, event.y) {
                (InteractionKind::KeyDown, Some(key), _, _) => {
                    session.record_key_down(key, event.timestamp_ms)
                }
                (InteractionKind::KeyUp, Some(key), _, _) => {
                    session.record_key_up(key, event.timestamp_ms)
                }
                (InteractionKind::PointerMove, _, Some(x), Some(y)) => {
                    session.record_pointer_move(x, y, event.timestamp_ms)
                }
                _ => debug!(
                    kind = event.kind.as_str(),
                    timestamp_ms = event.timestamp_ms,
                    "skipped incomplete interaction"
                ),
            }
        }

        session.stop();
        session
    }

    /// Validate a batch of events, including timestamp ordering
    pub fn validate_events(events: &[RawInteraction]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous: Option<i64> = None;

        for (index, event) in events.iter().enumerate() {
            if let Err(error) = event.validate() {
                results.push(ValidationResult { index, error });
            } else if let Some(prev) = previous.filter(|&p| event.timestamp_ms < p) {
                results.push(ValidationResult {
                    index,
                    error: ValidationError::OutOfOrder {
                        previous: prev,
                        current: event.timestamp_ms,
                    },
                });
            }
            previous = Some(previous.map_or(event.timestamp_ms, |p| p.max(event.timestamp_ms)));
        }

        results
    }
}

/// A diagnostic attached to one record of a stream
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub error: ValidationError,
}
