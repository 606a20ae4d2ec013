//! Reason codes for stabilizer decisions

use serde::{Deserialize, Serialize};

/// Why the stabilizer is in its current state after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R001: Observation
    // =========================================================================
    /// Frame had no hand (or the source produced nothing)
    R001_NO_HAND,
    /// Hand present but no gesture rule matched
    R001_NO_GESTURE,

    // =========================================================================
    // R002: Threshold
    // =========================================================================
    /// Gesture recognized at or below the confidence threshold
    R002_BELOW_THRESHOLD,

    // =========================================================================
    // R003: Hold
    // =========================================================================
    /// A new candidate started its hold
    R003_CANDIDATE_STARTED,
    /// Candidate held, not yet long enough
    R003_HOLD_ACCUMULATING,
    /// Candidate confirmed before, waiting for the hold window to re-arm
    R003_REARMING,

    // =========================================================================
    // R004: Confirmation
    // =========================================================================
    /// Hold window reached, confirmation emitted
    R004_CONFIRMED,

    // =========================================================================
    // R005: Transitions
    // =========================================================================
    /// Tracking dropped because a different gesture appeared
    R005_CANDIDATE_CHANGED,
    /// Tracking dropped because confidence fell to the threshold
    R005_CONFIDENCE_LOST,
    /// Tracking dropped because the hand disappeared
    R005_HAND_LOST,
    /// Detection stopped externally
    R005_SESSION_STOPPED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_NO_HAND => "R001_NO_HAND",
            Self::R001_NO_GESTURE => "R001_NO_GESTURE",
            Self::R002_BELOW_THRESHOLD => "R002_BELOW_THRESHOLD",
            Self::R003_CANDIDATE_STARTED => "R003_CANDIDATE_STARTED",
            Self::R003_HOLD_ACCUMULATING => "R003_HOLD_ACCUMULATING",
            Self::R003_REARMING => "R003_REARMING",
            Self::R004_CONFIRMED => "R004_CONFIRMED",
            Self::R005_CANDIDATE_CHANGED => "R005_CANDIDATE_CHANGED",
            Self::R005_CONFIDENCE_LOST => "R005_CONFIDENCE_LOST",
            Self::R005_HAND_LOST => "R005_HAND_LOST",
            Self::R005_SESSION_STOPPED => "R005_SESSION_STOPPED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_NO_HAND => "No hand in frame",
            Self::R001_NO_GESTURE => "No gesture recognized",
            Self::R002_BELOW_THRESHOLD => "Confidence below threshold",
            Self::R003_CANDIDATE_STARTED => "Hold started",
            Self::R003_HOLD_ACCUMULATING => "Holding",
            Self::R003_REARMING => "Holding - waiting to re-fire",
            Self::R004_CONFIRMED => "Gesture confirmed",
            Self::R005_CANDIDATE_CHANGED => "Gesture changed - hold cancelled",
            Self::R005_CONFIDENCE_LOST => "Confidence dropped - hold cancelled",
            Self::R005_HAND_LOST => "Hand lost - hold cancelled",
            Self::R005_SESSION_STOPPED => "Detection stopped",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
