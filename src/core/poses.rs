//! Synthetic upright hands for demos and tests
//!
//! `pose(g, s)` builds a frame the classifier scores as `g` at confidence `s`
//! (for `0 < s <= 1`). Each gesture sits at its own height so every joint
//! stays inside the normalized image.

use crate::types::{Finger, Gesture, HandLandmark, Landmark, LandmarkFrame, LANDMARK_COUNT};
use crate::{
    OPEN_HAND_EXTENSION_GAIN, PEACE_EXTENSION_GAIN, PEACE_FOLD_GAIN,
    THUMBS_UP_EXTENSION_GAIN, THUMBS_UP_FOLD_GAIN,
};

/// Slightly past full confidence, so float error cannot pull it under 1.0
pub const CANONICAL_STRENGTH: f32 = 1.05;

/// A clear, full-confidence example of a gesture
pub fn canonical_frame(gesture: Gesture) -> LandmarkFrame {
    pose(gesture, CANONICAL_STRENGTH)
}

/// A frame classified as `gesture` at confidence `min(strength, 1)`.
///
/// `Gesture::None` ignores `strength` and yields a hand matching no rule.
pub fn pose(gesture: Gesture, strength: f32) -> LandmarkFrame {
    let s = strength.max(0.0);
    match gesture {
        Gesture::ThumbsUp => HandBuilder::new(0.5)
            .thumb_up(s / THUMBS_UP_EXTENSION_GAIN)
            .fold_all(s / THUMBS_UP_FOLD_GAIN)
            .build(),
        Gesture::Peace => HandBuilder::new(0.45)
            .thumb_folded()
            .extend(Finger::Index, s / PEACE_EXTENSION_GAIN)
            .extend(Finger::Middle, s / PEACE_EXTENSION_GAIN)
            .fold(Finger::Ring, s / PEACE_FOLD_GAIN)
            .fold(Finger::Pinky, s / PEACE_FOLD_GAIN)
            .build(),
        Gesture::OpenHand => HandBuilder::new(0.55)
            .thumb_up(0.1)
            .extend_all(s / OPEN_HAND_EXTENSION_GAIN)
            .build(),
        // Pointing index, thumb tucked
        Gesture::None => HandBuilder::new(0.5)
            .thumb_folded()
            .extend(Finger::Index, 0.2)
            .fold(Finger::Middle, 0.2)
            .fold(Finger::Ring, 0.2)
            .fold(Finger::Pinky, 0.2)
            .build(),
    }
}

/// Places joints relative to a common PIP row
struct HandBuilder {
    pip_y: f32,
    points: Vec<Landmark>,
}

impl HandBuilder {
    fn new(pip_y: f32) -> Self {
        let mut points = vec![Landmark::default(); LANDMARK_COUNT];
        let set = |points: &mut Vec<Landmark>, lm: HandLandmark, x: f32, y: f32| {
            points[lm.index()] = Landmark::new(x, y, 0.0);
        };

        set(&mut points, HandLandmark::Wrist, 0.5, pip_y + 0.35);
        set(&mut points, HandLandmark::ThumbCmc, 0.38, pip_y + 0.3);
        set(&mut points, HandLandmark::ThumbMcp, 0.34, pip_y + 0.2);
        set(&mut points, HandLandmark::ThumbIp, 0.31, pip_y + 0.1);
        for (i, finger) in Finger::ALL.iter().enumerate() {
            let x = 0.42 + 0.06 * i as f32;
            set(&mut points, mcp_of(*finger), x, pip_y + 0.1);
            set(&mut points, finger.pip(), x, pip_y);
        }

        let builder = Self { pip_y, points };
        // Neutral: slightly folded everywhere
        builder.thumb_folded().fold_all(0.05)
    }

    fn thumb_ip_y(&self) -> f32 {
        self.points[HandLandmark::ThumbIp.index()].y
    }

    fn thumb_up(mut self, margin: f32) -> Self {
        let y = self.thumb_ip_y() - margin;
        self.points[HandLandmark::ThumbTip.index()] = Landmark::new(0.29, y, 0.0);
        self
    }

    fn thumb_folded(mut self) -> Self {
        // Below both IP and MCP
        let y = self.pip_y + 0.25;
        self.points[HandLandmark::ThumbTip.index()] = Landmark::new(0.4, y, 0.0);
        self
    }

    fn place_tip(mut self, finger: Finger, tip_y: f32) -> Self {
        let x = self.points[finger.pip().index()].x;
        let pip_y = self.pip_y;
        self.points[dip_of(finger).index()] = Landmark::new(x, (pip_y + tip_y) / 2.0, 0.0);
        self.points[finger.tip().index()] = Landmark::new(x, tip_y, 0.0);
        self
    }

    fn extend(self, finger: Finger, margin: f32) -> Self {
        let y = self.pip_y - margin;
        self.place_tip(finger, y)
    }

    fn fold(self, finger: Finger, margin: f32) -> Self {
        let y = self.pip_y + margin;
        self.place_tip(finger, y)
    }

    fn extend_all(self, margin: f32) -> Self {
        Finger::ALL.into_iter().fold(self, |b, f| b.extend(f, margin))
    }

    fn fold_all(self, margin: f32) -> Self {
        Finger::ALL.into_iter().fold(self, |b, f| b.fold(f, margin))
    }

    fn build(self) -> LandmarkFrame {
        LandmarkFrame::new(self.points)
    }
}

fn mcp_of(finger: Finger) -> HandLandmark {
    match finger {
        Finger::Index => HandLandmark::IndexMcp,
        Finger::Middle => HandLandmark::MiddleMcp,
        Finger::Ring => HandLandmark::RingMcp,
        Finger::Pinky => HandLandmark::PinkyMcp,
    }
}

fn dip_of(finger: Finger) -> HandLandmark {
    match finger {
        Finger::Index => HandLandmark::IndexDip,
        Finger::Middle => HandLandmark::MiddleDip,
        Finger::Ring => HandLandmark::RingDip,
        Finger::Pinky => HandLandmark::PinkyDip,
    }
}
