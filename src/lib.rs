//! Handsign: hand-pose gestures to reaction effects
//!
//! landmark frame → classifier → stabilizer → dispatcher → effect scheduler → sink

pub mod core;
pub mod error;
pub mod types;

pub use error::{Error, Result};

// =============================================================================
// STABILIZER DEFAULTS
// =============================================================================

/// Confidence a classification must exceed to count toward a hold
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Continuous hold before a gesture is confirmed (milliseconds).
/// Also the re-fire interval while the gesture stays held.
pub const DEFAULT_HOLD_DURATION_MS: u64 = 800;

// =============================================================================
// REACTION DEFAULTS
// =============================================================================

/// Reaction events per confirmation
pub const DEFAULT_BURST_COUNT: usize = 5;

/// Gap between consecutive events of one burst (milliseconds)
pub const DEFAULT_STAGGER_INTERVAL_MS: u64 = 150;

/// Effect token lifetime bounds (milliseconds)
pub const DEFAULT_EFFECT_LIFETIME_MIN_MS: u64 = 3000;
pub const DEFAULT_EFFECT_LIFETIME_MAX_MS: u64 = 6000;

/// Effect token size bounds (pixels)
pub const DEFAULT_EFFECT_SIZE_MIN_PX: f32 = 40.0;
pub const DEFAULT_EFFECT_SIZE_MAX_PX: f32 = 80.0;

/// Effect tokens are tilted uniformly within ±this many degrees
pub const DEFAULT_EFFECT_ROTATION_DEG: f32 = 15.0;

/// Live-mode pacing between frame pulls (milliseconds, ~30 fps)
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

// =============================================================================
// CONFIG LIMITS
// =============================================================================

pub const MAX_HOLD_DURATION_MS: u64 = 60_000;
pub const MAX_BURST_COUNT: usize = 100;
pub const MAX_STAGGER_INTERVAL_MS: u64 = 10_000;
pub const MAX_EFFECT_LIFETIME_MS: u64 = 60_000;
pub const MAX_FRAME_INTERVAL_MS: u64 = 10_000;

// =============================================================================
// CLASSIFIER MARGIN GAINS
// =============================================================================

pub const THUMBS_UP_EXTENSION_GAIN: f32 = 5.0;
pub const THUMBS_UP_FOLD_GAIN: f32 = 3.0;
pub const PEACE_EXTENSION_GAIN: f32 = 4.0;
pub const PEACE_FOLD_GAIN: f32 = 2.0;
pub const OPEN_HAND_EXTENSION_GAIN: f32 = 2.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
