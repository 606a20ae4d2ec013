//! Core types for handsign

mod landmark;
mod gesture;
mod state;
mod reason;
mod output;
mod reaction;

pub use landmark::{Landmark, LandmarkFrame, HandLandmark, Finger, LANDMARK_COUNT};
pub use gesture::{Gesture, Classification, sanitize_confidence};
pub use state::StabilizerState;
pub use reason::ReasonCode;
pub use output::StabilizerOutput;
pub use reaction::{ReactionEvent, EffectToken, TokenId, Position};
