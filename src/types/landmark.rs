//! Hand landmark frames
//!
//! 21 points per hand in normalized image space (x right, y down, z depth).

use serde::{Deserialize, Serialize};

/// Number of landmarks in a complete hand frame
pub const LANDMARK_COUNT: usize = 21;

/// Anatomical landmark index scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    /// Position of this landmark in a frame (0-20)
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The four non-thumb fingers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Middle joint the tip is compared against
    pub fn pip(&self) -> HandLandmark {
        match self {
            Finger::Index => HandLandmark::IndexPip,
            Finger::Middle => HandLandmark::MiddlePip,
            Finger::Ring => HandLandmark::RingPip,
            Finger::Pinky => HandLandmark::PinkyPip,
        }
    }

    pub fn tip(&self) -> HandLandmark {
        match self {
            Finger::Index => HandLandmark::IndexTip,
            Finger::Middle => HandLandmark::MiddleTip,
            Finger::Ring => HandLandmark::RingTip,
            Finger::Pinky => HandLandmark::PinkyTip,
        }
    }
}

/// A single landmark, serialized as `[x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(l: Landmark) -> Self {
        [l.x, l.y, l.z]
    }
}

/// One observed hand.
///
/// A frame may carry fewer than [`LANDMARK_COUNT`] points when the upstream
/// tracker lost part of the hand; such frames are kept as-is and the
/// classifier treats them as "no gesture".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkFrame {
    points: Vec<Landmark>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Has every landmark of the anatomical scheme
    pub fn is_complete(&self) -> bool {
        self.points.len() >= LANDMARK_COUNT
    }

    pub fn get(&self, landmark: HandLandmark) -> Option<&Landmark> {
        self.points.get(landmark.index())
    }

    /// Vertical coordinate of a landmark (smaller is higher in the image)
    pub fn y(&self, landmark: HandLandmark) -> Option<f32> {
        self.get(landmark).map(|l| l.y)
    }

    /// Replace one landmark, returning the modified frame
    pub fn with(mut self, landmark: HandLandmark, point: Landmark) -> Self {
        if let Some(slot) = self.points.get_mut(landmark.index()) {
            *slot = point;
        }
        self
    }
}
