//! Per-frame stabilizer output for display and the API

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::{Classification, Gesture, ReasonCode, StabilizerState};

/// Output structure for each stabilizer update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilizerOutput {
    /// Wall-clock timestamp
    pub timestamp: DateTime<Utc>,
    /// Session clock time of the update (milliseconds)
    pub at_ms: u64,
    /// Classifier label for this frame (`none` when no hand)
    pub label: Gesture,
    /// Classifier confidence for this frame
    pub confidence: f32,
    /// State after the update
    pub state: StabilizerState,
    /// How long the current candidate has been held (milliseconds)
    pub held_ms: u64,
    /// Reason for current state
    pub reason: ReasonCode,
    /// Gesture confirmed by this update, if any
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confirmed: Option<Gesture>,
}

impl StabilizerOutput {
    pub fn new(
        at_ms: u64,
        classification: Classification,
        state: StabilizerState,
        held_ms: u64,
        reason: ReasonCode,
        confirmed: Option<Gesture>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            at_ms,
            label: classification.label,
            confidence: classification.confidence,
            state,
            held_ms,
            reason,
            confirmed,
        }
    }

    pub fn is_confirmation(&self) -> bool {
        self.confirmed.is_some()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let line = format!(
            "{} t={}ms | {}@{:.2} | state={} | held={:.1}s | {}",
            self.state.emoji(),
            self.at_ms,
            self.label,
            self.confidence,
            self.state,
            self.held_ms as f64 / 1000.0,
            self.reason.code(),
        );
        if self.is_confirmation() {
            line.green().bold().to_string()
        } else {
            line.color(self.state.color()).to_string()
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "t={}ms | label={} | confidence={:.3} | state={} | held={:.1}s | reason={}",
            self.at_ms,
            self.label,
            self.confidence,
            self.state,
            self.held_ms as f64 / 1000.0,
            self.reason.code()
        )
    }
}
