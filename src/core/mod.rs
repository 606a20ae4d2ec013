//! Core modules for Handsign

pub mod config;
pub mod classifier;
pub mod poses;
pub mod clock;
pub mod stabilizer;
pub mod dispatcher;
pub mod effects;
pub mod source;
pub mod session;
pub mod api;

pub use config::{ReactionConfig, parse_duration_ms};
pub use classifier::{GestureClassifier, HandMargins};
pub use poses::{canonical_frame, pose};
pub use clock::{Clock, SystemClock, ManualClock};
pub use stabilizer::Stabilizer;
pub use dispatcher::ReactionDispatcher;
pub use effects::{EffectSink, EffectScheduler, RecordingSink, LogSink, JsonLinesSink, BroadcastSink};
pub use source::{FrameSource, FramePoll, ScriptedFrame, ScriptedSource, ChannelSource, FrameSender, PushSource, parse_script};
pub use session::{ReactionSession, StepOutcome, SessionStatus};
pub use api::{create_router, create_router_with_state, run_server, AppState};
