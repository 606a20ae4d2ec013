//! Reaction events and the effect tokens they become

use serde::{Deserialize, Serialize};

use crate::types::Gesture;

/// One event of a confirmation burst
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub gesture: Gesture,
    /// Session time of the confirmation that produced this burst
    pub fired_at_ms: u64,
    /// Position within the burst (0-based)
    pub index: usize,
    /// Session time at which this event is handed to the effect scheduler
    pub release_at_ms: u64,
    /// Presentation symbol chosen for this event
    pub symbol: String,
}

/// Unique, increasing token identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fx-{}", self.0)
    }
}

/// Normalized viewport position (0..1 on both axes, y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// A short-lived presentation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectToken {
    pub id: TokenId,
    pub gesture: Gesture,
    pub symbol: String,
    /// Start position; the effect floats upward from here
    pub position: Position,
    pub size_px: f32,
    pub rotation_deg: f32,
    pub duration_ms: u64,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

impl EffectToken {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}
