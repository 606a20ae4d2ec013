//! Confidence Stabilizer: hold-to-confirm state machine
//!
//! State transitions:
//! - IDLE → TRACKING(g): label g ≠ none, confidence > threshold
//! - TRACKING(g) → TRACKING(g): same label above threshold; confirms when held
//!   ≥ hold and the last confirmation is ≥ hold ago (repeats while held)
//! - TRACKING(g) → IDLE: different label, confidence ≤ threshold, or no hand
//! - any → IDLE: detection stopped

use tracing::{debug, info};

use crate::core::config::ReactionConfig;
use crate::types::{Classification, Gesture, ReasonCode, StabilizerOutput, StabilizerState};

/// The gesture being held. Its start time lives and dies with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    gesture: Gesture,
    since_ms: u64,
    last_fire_ms: Option<u64>,
}

/// Hold-to-confirm state machine
#[derive(Debug, Clone)]
pub struct Stabilizer {
    /// Confidence must be strictly above this
    threshold: f32,
    /// Hold window and re-fire interval
    hold_ms: u64,
    candidate: Option<Candidate>,
    update_count: u64,
    confirmations: u64,
}

impl Stabilizer {
    /// Create new stabilizer
    pub fn new(threshold: f32, hold_ms: u64) -> Self {
        Self {
            threshold,
            hold_ms,
            candidate: None,
            update_count: 0,
            confirmations: 0,
        }
    }

    pub fn from_config(config: &ReactionConfig) -> Self {
        Self::new(config.confidence_threshold, config.hold_duration_ms)
    }

    /// Feed one frame's classification at time `at_ms`.
    ///
    /// `None` means no hand was observed this tick.
    pub fn update(&mut self, observation: Option<Classification>, at_ms: u64) -> StabilizerOutput {
        self.update_count += 1;
        let classification = observation.unwrap_or_else(Classification::none);
        let qualifies = observation.is_some()
            && !classification.label.is_none()
            && classification.confidence > self.threshold;

        let (reason, confirmed) = match self.candidate {
            None => {
                if qualifies {
                    debug!(
                        "Candidate started: {} @{:.2} at {}ms",
                        classification.label, classification.confidence, at_ms
                    );
                    self.candidate = Some(Candidate {
                        gesture: classification.label,
                        since_ms: at_ms,
                        last_fire_ms: None,
                    });
                    (ReasonCode::R003_CANDIDATE_STARTED, None)
                } else if observation.is_none() {
                    (ReasonCode::R001_NO_HAND, None)
                } else if classification.label.is_none() {
                    (ReasonCode::R001_NO_GESTURE, None)
                } else {
                    (ReasonCode::R002_BELOW_THRESHOLD, None)
                }
            }

            Some(mut candidate) => {
                if qualifies && classification.label == candidate.gesture {
                    let held = at_ms.saturating_sub(candidate.since_ms);
                    let rearmed = candidate
                        .last_fire_ms
                        .map_or(true, |fired| at_ms.saturating_sub(fired) >= self.hold_ms);

                    let outcome = if held >= self.hold_ms && rearmed {
                        candidate.last_fire_ms = Some(at_ms);
                        self.confirmations += 1;
                        info!(
                            "Gesture confirmed: {} (held {}ms, #{})",
                            candidate.gesture, held, self.confirmations
                        );
                        (ReasonCode::R004_CONFIRMED, Some(candidate.gesture))
                    } else if candidate.last_fire_ms.is_some() {
                        (ReasonCode::R003_REARMING, None)
                    } else {
                        (ReasonCode::R003_HOLD_ACCUMULATING, None)
                    };
                    self.candidate = Some(candidate);
                    outcome
                } else {
                    let reason = if observation.is_none() {
                        ReasonCode::R005_HAND_LOST
                    } else if classification.label == candidate.gesture {
                        ReasonCode::R005_CONFIDENCE_LOST
                    } else {
                        ReasonCode::R005_CANDIDATE_CHANGED
                    };
                    debug!("Candidate {} dropped: {}", candidate.gesture, reason.code());
                    self.candidate = None;
                    (reason, None)
                }
            }
        };

        StabilizerOutput::new(
            at_ms,
            classification,
            self.state(),
            self.held_ms(at_ms),
            reason,
            confirmed,
        )
    }

    /// Forget any candidate; used when detection stops
    pub fn reset(&mut self) {
        if let Some(candidate) = self.candidate.take() {
            debug!("Candidate {} dropped: reset", candidate.gesture);
        }
    }

    /// Reset and report the stop as an output
    pub fn stop(&mut self, at_ms: u64) -> StabilizerOutput {
        self.reset();
        StabilizerOutput::new(
            at_ms,
            Classification::none(),
            self.state(),
            0,
            ReasonCode::R005_SESSION_STOPPED,
            None,
        )
    }

    /// Get current state
    pub fn state(&self) -> StabilizerState {
        match self.candidate {
            Some(c) => StabilizerState::Tracking(c.gesture),
            None => StabilizerState::Idle,
        }
    }

    pub fn active_candidate(&self) -> Option<Gesture> {
        self.candidate.map(|c| c.gesture)
    }

    pub fn candidate_since_ms(&self) -> Option<u64> {
        self.candidate.map(|c| c.since_ms)
    }

    pub fn last_fire_ms(&self) -> Option<u64> {
        self.candidate.and_then(|c| c.last_fire_ms)
    }

    /// How long the current candidate has been held at `now_ms`
    pub fn held_ms(&self, now_ms: u64) -> u64 {
        self.candidate
            .map(|c| now_ms.saturating_sub(c.since_ms))
            .unwrap_or(0)
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Confirmations emitted over the stabilizer's lifetime
    pub fn confirmations(&self) -> u64 {
        self.confirmations
    }
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::from_config(&ReactionConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_HOLD_DURATION_MS as HOLD;

    fn seen(label: Gesture, confidence: f32) -> Option<Classification> {
        Some(Classification::new(label, confidence))
    }

    #[test]
    fn test_initial_state_is_idle() {
        let stabilizer = Stabilizer::default();
        assert_eq!(stabilizer.state(), StabilizerState::Idle);
        assert_eq!(stabilizer.candidate_since_ms(), None);
        assert_eq!(stabilizer.last_fire_ms(), None);
    }

    #[test]
    fn test_idle_to_tracking() {
        let mut s = Stabilizer::default();
        let out = s.update(seen(Gesture::Peace, 0.9), 100);
        assert_eq!(out.state, StabilizerState::Tracking(Gesture::Peace));
        assert_eq!(out.reason, ReasonCode::R003_CANDIDATE_STARTED);
        assert_eq!(s.candidate_since_ms(), Some(100));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut s = Stabilizer::new(0.7, HOLD);
        let out = s.update(seen(Gesture::Peace, 0.7), 0);
        assert_eq!(out.state, StabilizerState::Idle);
        assert_eq!(out.reason, ReasonCode::R002_BELOW_THRESHOLD);
    }

    #[test]
    fn test_none_label_never_tracks() {
        let mut s = Stabilizer::default();
        let out = s.update(seen(Gesture::None, 1.0), 0);
        assert_eq!(out.state, StabilizerState::Idle);
        assert_eq!(out.reason, ReasonCode::R001_NO_GESTURE);
    }

    #[test]
    fn test_no_hand_while_idle() {
        let mut s = Stabilizer::default();
        let out = s.update(None, 0);
        assert_eq!(out.reason, ReasonCode::R001_NO_HAND);
        assert_eq!(out.label, Gesture::None);
    }

    #[test]
    fn test_one_ms_short_does_not_confirm() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::ThumbsUp, 0.9), 0);
        let out = s.update(seen(Gesture::ThumbsUp, 0.9), HOLD - 1);
        assert!(!out.is_confirmation());
        assert_eq!(out.reason, ReasonCode::R003_HOLD_ACCUMULATING);
        assert_eq!(out.held_ms, HOLD - 1);

        let out = s.update(seen(Gesture::ThumbsUp, 0.9), HOLD);
        assert_eq!(out.confirmed, Some(Gesture::ThumbsUp));
        assert_eq!(s.confirmations(), 1);
    }

    #[test]
    fn test_repeat_while_held() {
        let mut s = Stabilizer::default();
        let mut fired_at = Vec::new();
        for t in (0..=3 * HOLD).step_by(100) {
            if s.update(seen(Gesture::OpenHand, 0.95), t).is_confirmation() {
                fired_at.push(t);
            }
        }
        assert_eq!(fired_at, vec![HOLD, 2 * HOLD, 3 * HOLD]);
    }

    #[test]
    fn test_rearming_reason_between_fires() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::OpenHand, 0.95), 0);
        s.update(seen(Gesture::OpenHand, 0.95), HOLD);
        let out = s.update(seen(Gesture::OpenHand, 0.95), HOLD + 100);
        assert_eq!(out.reason, ReasonCode::R003_REARMING);
        assert_eq!(s.last_fire_ms(), Some(HOLD));
    }

    #[test]
    fn test_hand_lost_resets() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::Peace, 0.9), 0);
        let out = s.update(None, 400);
        assert_eq!(out.state, StabilizerState::Idle);
        assert_eq!(out.reason, ReasonCode::R005_HAND_LOST);
        assert_eq!(s.candidate_since_ms(), None);
    }

    #[test]
    fn test_confidence_dip_resets() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::Peace, 0.9), 0);
        let out = s.update(seen(Gesture::Peace, 0.5), 400);
        assert_eq!(out.reason, ReasonCode::R005_CONFIDENCE_LOST);
        assert_eq!(out.state, StabilizerState::Idle);
    }

    #[test]
    fn test_gesture_change_goes_idle_first() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::Peace, 0.9), 0);
        let out = s.update(seen(Gesture::ThumbsUp, 0.9), 400);
        assert_eq!(out.reason, ReasonCode::R005_CANDIDATE_CHANGED);
        assert_eq!(out.state, StabilizerState::Idle);

        let out = s.update(seen(Gesture::ThumbsUp, 0.9), 433);
        assert_eq!(out.state, StabilizerState::Tracking(Gesture::ThumbsUp));
        assert_eq!(s.candidate_since_ms(), Some(433));
    }

    #[test]
    fn test_interruption_clears_credit() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::ThumbsUp, 0.9), 0);
        s.update(seen(Gesture::ThumbsUp, 0.9), 700);
        s.update(seen(Gesture::None, 0.0), 750);
        s.update(seen(Gesture::ThumbsUp, 0.9), 800);
        let out = s.update(seen(Gesture::ThumbsUp, 0.9), 1500);
        assert!(!out.is_confirmation());
        let out = s.update(seen(Gesture::ThumbsUp, 0.9), 1600);
        assert!(out.is_confirmation());
    }

    #[test]
    fn test_stop_resets_everything() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::OpenHand, 0.9), 0);
        s.update(seen(Gesture::OpenHand, 0.9), HOLD);
        let out = s.stop(HOLD + 10);
        assert_eq!(out.reason, ReasonCode::R005_SESSION_STOPPED);
        assert_eq!(s.state(), StabilizerState::Idle);
        assert_eq!(s.active_candidate(), None);
        assert_eq!(s.candidate_since_ms(), None);
        assert_eq!(s.last_fire_ms(), None);
    }

    #[test]
    fn test_clock_going_backwards_does_not_panic() {
        let mut s = Stabilizer::default();
        s.update(seen(Gesture::Peace, 0.9), 1000);
        let out = s.update(seen(Gesture::Peace, 0.9), 500);
        assert_eq!(out.held_ms, 0);
        assert!(!out.is_confirmation());
    }
}
