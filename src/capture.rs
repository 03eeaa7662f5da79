//! Capture session (event sink)
//!
//! Buffers raw keyboard and pointer interactions for one bounded capture
//! interval. Derives only what must be computed incrementally: key hold
//! durations (from the pending key-down map) and pointer velocity (from the
//! bounded position history). Everything else is left to the feature extractor.

use crate::features::FeatureExtractor;
use crate::types::{BehavioralFeatureVector, InteractionEvent};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Number of recent pointer positions retained for velocity computation
pub const POINTER_HISTORY_LEN: usize = 100;

#[derive(Debug, Clone, Copy)]
struct PointerPosition {
    x: f64,
    y: f64,
    timestamp_ms: i64,
}

/// One capture session. Each caller owns its own session; there is no shared
/// or global capture state.
#[derive(Debug, Clone, Default)]
pub struct CaptureSession {
    /// Recorded events in insertion order
    events: Vec<InteractionEvent>,
    /// Pending key-down timestamps keyed by key identifier
    pending_key_downs: HashMap<String, i64>,
    /// Last pointer positions, oldest first
    pointer_history: VecDeque<PointerPosition>,
    /// Number of key events recorded so far
    key_events: usize,
    capturing: bool,
}

impl CaptureSession {
    /// Create an idle session. Call [`start`](Self::start) to begin recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all buffers and begin recording.
    ///
    /// Calling `start` on a session that is already recording discards what
    /// it has captured so far.
    pub fn start(&mut self) {
        if self.capturing {
            debug!(discarded = self.events.len(), "capture restarted");
        }
        self.events.clear();
        self.pending_key_downs.clear();
        self.pointer_history.clear();
        self.key_events = 0;
        self.capturing = true;
    }

    /// Freeze the session. Later `record_*` calls are ignored.
    pub fn stop(&mut self) {
        self.capturing = false;
        self.pending_key_downs.clear();
        self.pointer_history.clear();
        debug!(
            events = self.events.len(),
            key_events = self.key_events,
            "capture stopped"
        );
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Record a key press. A repeated press of a held key overwrites the
    /// pending timestamp (auto-repeat is not distinguished).
    pub fn record_key_down(&mut self, key: &str, timestamp_ms: i64) {
        if !self.capturing {
            return;
        }
        self.pending_key_downs.insert(key.to_string(), timestamp_ms);
        self.events.push(InteractionEvent::key_down(timestamp_ms, key));
        self.key_events += 1;
    }

    /// Record a key release. Without a matching pending press no duration can
    /// be computed and the release is dropped.
    pub fn record_key_up(&mut self, key: &str, timestamp_ms: i64) {
        if !self.capturing {
            return;
        }
        match self.pending_key_downs.remove(key) {
            Some(down_ms) => {
                let duration_ms = timestamp_ms.saturating_sub(down_ms);
                self.events
                    .push(InteractionEvent::key_up(timestamp_ms, key, duration_ms));
                self.key_events += 1;
            }
            None => debug!(key, timestamp_ms, "unmatched key-up dropped"),
        }
    }

    /// Record a pointer position. Every position after the first yields a
    /// velocity sample against the previous one.
    pub fn record_pointer_move(&mut self, x: f64, y: f64, timestamp_ms: i64) {
        if !self.capturing {
            return;
        }

        let velocity = self.pointer_history.back().map(|prev| {
            let distance = ((x - prev.x).powi(2) + (y - prev.y).powi(2)).sqrt();
            let elapsed_ms = timestamp_ms.saturating_sub(prev.timestamp_ms);
            if elapsed_ms > 0 {
                distance / elapsed_ms as f64
            } else {
                0.0
            }
        });

        self.pointer_history.push_back(PointerPosition {
            x,
            y,
            timestamp_ms,
        });
        if self.pointer_history.len() > POINTER_HISTORY_LEN {
            self.pointer_history.pop_front();
        }

        if let Some(velocity) = velocity {
            self.events
                .push(InteractionEvent::pointer_move(timestamp_ms, x, y, velocity));
        }
    }

    /// Total number of recorded events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of recorded key-down and key-up events
    pub fn key_event_count(&self) -> usize {
        self.key_events
    }

    /// Recorded events in insertion order
    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    /// Stop the session and derive its feature vector, consuming it.
    pub fn into_features(mut self) -> BehavioralFeatureVector {
        self.stop();
        FeatureExtractor::extract(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InteractionKind;
    use pretty_assertions::assert_eq;

    fn started() -> CaptureSession {
        let mut session = CaptureSession::new();
        session.start();
        session
    }

    #[test]
    fn test_new_session_ignores_events_until_started() {
        let mut session = CaptureSession::new();
        session.record_key_down("a", 0);
        assert_eq!(session.event_count(), 0);
        assert!(!session.is_capturing());
    }

    #[test]
    fn test_key_up_carries_hold_duration() {
        let mut session = started();
        session.record_key_down("a", 1_000);
        session.record_key_up("a", 1_085);

        let events = session.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, InteractionKind::KeyDown);
        assert_eq!(events[1].kind, InteractionKind::KeyUp);
        assert_eq!(events[1].duration_ms, Some(85));
        assert_eq!(session.key_event_count(), 2);
    }

    #[test]
    fn test_unmatched_key_up_is_dropped() {
        let mut session = started();
        session.record_key_up("a", 500);
        assert_eq!(session.event_count(), 0);

        // A matched release clears the pending press, so a second release drops.
        session.record_key_down("b", 600);
        session.record_key_up("b", 650);
        session.record_key_up("b", 700);
        assert_eq!(session.event_count(), 2);
    }

    #[test]
    fn test_repeated_key_down_overwrites_pending() {
        let mut session = started();
        session.record_key_down("a", 100);
        session.record_key_down("a", 150);
        session.record_key_up("a", 200);

        let up = session.events().last().unwrap();
        assert_eq!(up.duration_ms, Some(50));
        assert_eq!(session.key_event_count(), 3);
    }

    #[test]
    fn test_first_pointer_position_has_no_velocity_sample() {
        let mut session = started();
        session.record_pointer_move(0.0, 0.0, 0);
        assert_eq!(session.event_count(), 0);

        session.record_pointer_move(3.0, 4.0, 10);
        assert_eq!(session.event_count(), 1);
        let sample = &session.events()[0];
        assert_eq!(sample.kind, InteractionKind::PointerMove);
        assert!((sample.velocity.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_elapsed_pointer_move_has_zero_velocity() {
        let mut session = started();
        session.record_pointer_move(0.0, 0.0, 50);
        session.record_pointer_move(30.0, 40.0, 50);
        assert_eq!(session.events()[0].velocity, Some(0.0));
    }

    #[test]
    fn test_pointer_history_is_bounded() {
        let mut session = started();
        for i in 0..250 {
            session.record_pointer_move(i as f64, 0.0, i * 10);
        }
        assert_eq!(session.pointer_history.len(), POINTER_HISTORY_LEN);
        assert_eq!(session.pointer_history.front().unwrap().timestamp_ms, 1_500);
        // Every position but the first produced a sample.
        assert_eq!(session.event_count(), 249);
    }

    #[test]
    fn test_stop_freezes_session() {
        let mut session = started();
        session.record_key_down("a", 0);
        session.stop();
        session.record_key_up("a", 80);
        session.record_key_down("b", 90);
        session.record_pointer_move(1.0, 1.0, 100);

        assert_eq!(session.event_count(), 1);
        assert!(!session.is_capturing());
    }

    #[test]
    fn test_start_resets_buffers() {
        let mut session = started();
        session.record_key_down("a", 0);
        session.record_pointer_move(0.0, 0.0, 0);
        session.start();

        assert_eq!(session.event_count(), 0);
        assert_eq!(session.key_event_count(), 0);

        // The earlier press no longer pairs with a release.
        session.record_key_up("a", 40);
        assert_eq!(session.event_count(), 0);
        // The earlier position no longer yields a velocity sample.
        session.record_pointer_move(5.0, 5.0, 10);
        assert_eq!(session.event_count(), 0);
    }

    #[test]
    fn test_key_event_count_excludes_pointer_events() {
        let mut session = started();
        session.record_key_down("a", 0);
        session.record_pointer_move(0.0, 0.0, 5);
        session.record_pointer_move(1.0, 0.0, 10);
        session.record_key_up("a", 20);

        assert_eq!(session.event_count(), 3);
        assert_eq!(session.key_event_count(), 2);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut session = started();
        session.record_key_down("a", i64::MIN);
        session.record_key_up("a", i64::MAX);
        assert_eq!(session.events()[1].duration_ms, Some(i64::MAX));

        session.record_key_down("b", i64::MAX);
        session.record_key_up("b", i64::MIN);
        assert_eq!(session.events()[3].duration_ms, Some(i64::MIN));

        session.record_pointer_move(0.0, 0.0, i64::MIN);
        session.record_pointer_move(3.0, 4.0, i64::MAX);
        let velocity = session.events()[4].velocity.unwrap();
        assert!(velocity.is_finite() && velocity >= 0.0);

        session.record_pointer_move(6.0, 8.0, i64::MIN);
        assert_eq!(session.events()[5].velocity, Some(0.0));
    }
}
