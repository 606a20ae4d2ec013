//! Stabilizer state definitions

use colored::Color;
use serde::{Deserialize, Serialize};

use crate::types::Gesture;

/// The two states of the confirmation state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "gesture", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StabilizerState {
    /// No candidate being held
    Idle,
    /// A candidate gesture is being held above threshold
    Tracking(Gesture),
}

impl StabilizerState {
    /// Terminal color for display
    pub fn color(&self) -> Color {
        match self {
            StabilizerState::Idle => Color::BrightBlack,
            StabilizerState::Tracking(_) => Color::Yellow,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StabilizerState::Idle => "💤",
            StabilizerState::Tracking(_) => "✋",
        }
    }
}

impl std::fmt::Display for StabilizerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StabilizerState::Idle => write!(f, "IDLE"),
            StabilizerState::Tracking(g) => write!(f, "TRACKING({})", g),
        }
    }
}
