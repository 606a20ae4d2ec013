//! Gesture vocabulary and per-frame classification results

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// The closed set of recognized gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Thumb up, other fingers folded
    ThumbsUp,
    /// Index and middle up, ring and pinky folded
    Peace,
    /// All five fingers extended (the "wave" trigger)
    #[serde(alias = "wave")]
    OpenHand,
    /// Nothing recognized
    None,
}

impl Gesture {
    /// Gestures that can be confirmed, in classifier evaluation order
    pub const RECOGNIZED: [Gesture; 3] = [Gesture::ThumbsUp, Gesture::Peace, Gesture::OpenHand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::ThumbsUp => "thumbs_up",
            Gesture::Peace => "peace",
            Gesture::OpenHand => "open_hand",
            Gesture::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Gesture::None
    }

    /// Reaction symbols, picked uniformly per event
    pub fn symbols(&self) -> &'static [&'static str] {
        match self {
            Gesture::ThumbsUp => &["👍", "💪", "✨", "🙌", "🔥"],
            Gesture::Peace => &["✌️", "😎", "🎉", "🕊️", "🌈"],
            Gesture::OpenHand => &["👋", "💫", "❤️", "🖐️", "🌟"],
            Gesture::None => &[],
        }
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gesture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "thumbs_up" | "thumbsup" => Ok(Gesture::ThumbsUp),
            "peace" => Ok(Gesture::Peace),
            "open_hand" | "openhand" | "wave" => Ok(Gesture::OpenHand),
            "none" => Ok(Gesture::None),
            _ => Err(Error::UnknownGesture(s.to_string())),
        }
    }
}

/// Classifier output for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Gesture,
    /// Always within [0, 1]
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: Gesture, confidence: f32) -> Self {
        Self {
            label,
            confidence: sanitize_confidence(confidence),
        }
    }

    /// `{None, 0}`
    pub fn none() -> Self {
        Self {
            label: Gesture::None,
            confidence: 0.0,
        }
    }
}

/// Clamp into [0, 1]; NaN and infinities become 0
pub fn sanitize_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
