//! Gesture Classifier: landmark frame → (gesture, confidence)
//!
//! Vertical-only heuristics on an upright, camera-facing hand. Each rule
//! measures how far the relevant joints clear each other and turns the
//! tightest margin into a confidence.
//!
//! - ThumbsUp: thumb tip above IP, four fingertips below their PIPs
//! - Peace:    index + middle above PIPs, ring + pinky below
//! - OpenHand: thumb tip above MCP, four fingertips above PIPs

use crate::types::{Classification, Finger, Gesture, HandLandmark, LandmarkFrame, sanitize_confidence};
use crate::{
    OPEN_HAND_EXTENSION_GAIN, PEACE_EXTENSION_GAIN, PEACE_FOLD_GAIN,
    THUMBS_UP_EXTENSION_GAIN, THUMBS_UP_FOLD_GAIN,
};

/// Signed vertical margins of one frame.
///
/// Positive extension = tip above its reference joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandMargins {
    /// Thumb tip above thumb IP
    pub thumb_over_ip: f32,
    /// Thumb tip above thumb MCP
    pub thumb_over_mcp: f32,
    /// Tip above PIP, in `Finger::ALL` order
    pub fingers: [f32; 4],
}

impl HandMargins {
    /// Measure a frame; `None` when any needed landmark is missing
    pub fn measure(frame: &LandmarkFrame) -> Option<Self> {
        let thumb_tip = frame.y(HandLandmark::ThumbTip)?;
        let thumb_ip = frame.y(HandLandmark::ThumbIp)?;
        let thumb_mcp = frame.y(HandLandmark::ThumbMcp)?;

        let mut fingers = [0.0; 4];
        for (slot, finger) in fingers.iter_mut().zip(Finger::ALL) {
            *slot = frame.y(finger.pip())? - frame.y(finger.tip())?;
        }

        Some(Self {
            thumb_over_ip: thumb_ip - thumb_tip,
            thumb_over_mcp: thumb_mcp - thumb_tip,
            fingers,
        })
    }

    fn extension(&self, finger: Finger) -> f32 {
        self.fingers[finger as usize]
    }

    fn fold(&self, finger: Finger) -> f32 {
        -self.extension(finger)
    }

    fn all_extended(&self) -> bool {
        self.fingers.iter().all(|m| *m > 0.0)
    }

    fn all_folded(&self) -> bool {
        self.fingers.iter().all(|m| *m < 0.0)
    }
}

/// Stateless gesture classifier
#[derive(Debug, Default, Clone, Copy)]
pub struct GestureClassifier;

impl GestureClassifier {
    /// Create new classifier
    pub fn new() -> Self {
        Self
    }

    /// Classify a frame. Never fails: incomplete or degenerate frames give `{None, 0}`.
    pub fn classify(&self, frame: &LandmarkFrame) -> Classification {
        if !frame.is_complete() {
            return Classification::none();
        }
        let Some(margins) = HandMargins::measure(frame) else {
            return Classification::none();
        };

        // Strict `>` keeps the earlier gesture on ties
        let mut best = Classification::none();
        for gesture in Gesture::RECOGNIZED {
            if let Some(confidence) = self.score(gesture, &margins) {
                if confidence > best.confidence {
                    best = Classification::new(gesture, confidence);
                }
            }
        }
        best
    }

    /// Confidence for one gesture, `None` if its predicate fails
    pub fn score(&self, gesture: Gesture, m: &HandMargins) -> Option<f32> {
        let raw = match gesture {
            Gesture::ThumbsUp => {
                if !(m.thumb_over_ip > 0.0 && m.all_folded()) {
                    return None;
                }
                (m.thumb_over_ip * THUMBS_UP_EXTENSION_GAIN)
                    .min(m.fold(Finger::Index) * THUMBS_UP_FOLD_GAIN)
            }
            Gesture::Peace => {
                let up = m.extension(Finger::Index) > 0.0 && m.extension(Finger::Middle) > 0.0;
                let down = m.fold(Finger::Ring) > 0.0 && m.fold(Finger::Pinky) > 0.0;
                if !(up && down) {
                    return None;
                }
                (m.extension(Finger::Index) * PEACE_EXTENSION_GAIN)
                    .min(m.extension(Finger::Middle) * PEACE_EXTENSION_GAIN)
                    .min(m.fold(Finger::Ring) * PEACE_FOLD_GAIN)
            }
            Gesture::OpenHand => {
                if !(m.thumb_over_mcp > 0.0 && m.all_extended()) {
                    return None;
                }
                m.fingers
                    .iter()
                    .map(|e| e * OPEN_HAND_EXTENSION_GAIN)
                    .fold(f32::INFINITY, f32::min)
            }
            Gesture::None => return None,
        };
        Some(sanitize_confidence(raw))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::poses::{canonical_frame, pose};
    use crate::types::{Landmark, LANDMARK_COUNT};

    #[test]
    fn test_canonical_thumbs_up_is_full_confidence() {
        let result = GestureClassifier::new().classify(&canonical_frame(Gesture::ThumbsUp));
        assert_eq!(result.label, Gesture::ThumbsUp);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_canonical_poses_classify() {
        let classifier = GestureClassifier::new();
        for gesture in Gesture::RECOGNIZED {
            let result = classifier.classify(&canonical_frame(gesture));
            assert_eq!(result.label, gesture);
            assert_eq!(result.confidence, 1.0);
        }
    }

    #[test]
    fn test_relaxed_hand_is_none() {
        let result = GestureClassifier::new().classify(&canonical_frame(Gesture::None));
        assert_eq!(result, Classification::none());
    }

    #[test]
    fn test_confidence_follows_tightest_margin() {
        let result = GestureClassifier::new().classify(&pose(Gesture::Peace, 0.6));
        assert_eq!(result.label, Gesture::Peace);
        assert!((result.confidence - 0.6).abs() < 1e-4, "got {}", result.confidence);
    }

    #[test]
    fn test_incomplete_frame_is_none() {
        let mut points = canonical_frame(Gesture::OpenHand).points().to_vec();
        points.truncate(LANDMARK_COUNT - 1);
        let result = GestureClassifier::new().classify(&LandmarkFrame::new(points));
        assert_eq!(result, Classification::none());
    }

    #[test]
    fn test_empty_frame_is_none() {
        let result = GestureClassifier::new().classify(&LandmarkFrame::default());
        assert_eq!(result, Classification::none());
    }

    #[test]
    fn test_nan_coordinates_are_none() {
        let frame = canonical_frame(Gesture::ThumbsUp)
            .with(HandLandmark::ThumbTip, Landmark::new(0.3, f32::NAN, 0.0));
        let result = GestureClassifier::new().classify(&frame);
        assert_eq!(result, Classification::none());
    }

    #[test]
    fn test_infinite_margin_is_clamped() {
        let frame = canonical_frame(Gesture::ThumbsUp)
            .with(HandLandmark::ThumbTip, Landmark::new(0.3, f32::NEG_INFINITY, 0.0));
        let result = GestureClassifier::new().classify(&frame);
        assert_eq!(result.label, Gesture::ThumbsUp);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_flat_hand_matches_nothing() {
        // Every joint on one row: no margin is strictly positive
        let frame = LandmarkFrame::new(vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT]);
        let result = GestureClassifier::new().classify(&frame);
        assert_eq!(result, Classification::none());
    }

    #[test]
    fn test_thumbs_up_needs_every_finger_folded() {
        let base = canonical_frame(Gesture::ThumbsUp);
        let pip_y = base.y(HandLandmark::PinkyPip).unwrap();
        // Lift the pinky above its PIP
        let frame = base.with(HandLandmark::PinkyTip, Landmark::new(0.6, pip_y - 0.1, 0.0));
        let result = GestureClassifier::new().classify(&frame);
        assert_ne!(result.label, Gesture::ThumbsUp);
    }

    #[test]
    fn test_determinism() {
        let classifier = GestureClassifier::new();
        let frame = pose(Gesture::OpenHand, 0.8);
        assert_eq!(classifier.classify(&frame), classifier.classify(&frame));
    }
}
