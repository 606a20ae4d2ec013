//! Reaction session: one source, one pipeline, one sink
//!
//! Frames are processed strictly one at a time:
//! classify → stabilize → dispatch → release due reactions → sweep tokens.
//! Staggered reactions and token expiries are timestamps drained by `tick`,
//! so nothing here waits on real time.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::classifier::GestureClassifier;
use crate::core::clock::Clock;
use crate::core::config::ReactionConfig;
use crate::core::dispatcher::ReactionDispatcher;
use crate::core::effects::{EffectScheduler, EffectSink};
use crate::core::source::{FramePoll, FrameSource};
use crate::core::stabilizer::Stabilizer;
use crate::error::{Error, Result};
use crate::types::{EffectToken, LandmarkFrame, ReactionEvent, StabilizerOutput, StabilizerState};

/// What one `step` did
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// A frame (or an empty tick) went through the pipeline
    Processed(StabilizerOutput),
    /// The source ran dry; the session stopped itself
    Ended,
    /// `start()` has not been called, or `stop()` was
    Inactive,
}

/// Snapshot of a session for status displays
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub active: bool,
    pub state: StabilizerState,
    pub held_ms: u64,
    pub frames_processed: u64,
    pub confirmations: u64,
    pub pending_reactions: usize,
    pub live_tokens: usize,
}

/// Owns the whole pipeline for one user
pub struct ReactionSession<S: FrameSource, K: EffectSink, C: Clock> {
    config: ReactionConfig,
    source: S,
    clock: C,
    classifier: GestureClassifier,
    stabilizer: Stabilizer,
    dispatcher: ReactionDispatcher,
    scheduler: EffectScheduler<K>,
    /// Ordered by release time
    pending: Vec<ReactionEvent>,
    rng: StdRng,
    active: bool,
    frames_processed: u64,
}

impl<S: FrameSource, K: EffectSink, C: Clock> ReactionSession<S, K, C> {
    /// Build a stopped session. Fails on an invalid config.
    pub fn new(config: ReactionConfig, source: S, sink: K, clock: C) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            classifier: GestureClassifier::new(),
            stabilizer: Stabilizer::from_config(&config),
            dispatcher: ReactionDispatcher::from_config(&config),
            scheduler: EffectScheduler::new(sink, &config),
            pending: Vec::new(),
            rng,
            active: false,
            frames_processed: 0,
            config,
            source,
            clock,
        })
    }

    // =========================================================================
    // CONTROL SURFACE
    // =========================================================================

    /// Acquire the source and begin accepting frames. Idempotent.
    ///
    /// If the source cannot be opened the session stays stopped and idle.
    pub fn start(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        if let Err(e) = self.source.open() {
            warn!("Could not start detection: {}", e);
            self.stabilizer.reset();
            return Err(match e {
                Error::SourceUnavailable(_) => e,
                other => Error::SourceUnavailable(other.to_string()),
            });
        }
        self.active = true;
        info!("Detection started");
        Ok(())
    }

    /// Stop accepting frames and reset the stabilizer. Idempotent.
    ///
    /// Reactions already scheduled keep draining on `tick`.
    pub fn stop(&mut self) -> Option<StabilizerOutput> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.source.close();
        let output = self.stabilizer.stop(self.clock.now_ms());
        info!(
            "Detection stopped after {} frames, {} confirmations",
            self.frames_processed,
            self.stabilizer.confirmations()
        );
        Some(output)
    }

    /// Pull one frame from the source and process it
    pub fn step(&mut self) -> StepOutcome {
        if !self.active {
            return StepOutcome::Inactive;
        }
        match self.source.next_frame() {
            FramePoll::Frame(frame) => StepOutcome::Processed(self.process(Some(&frame))),
            FramePoll::Empty => StepOutcome::Processed(self.process(None)),
            FramePoll::Ended => {
                debug!("Source ended");
                self.stop();
                StepOutcome::Ended
            }
        }
    }

    /// Process a frame handed in directly (`None`: no hand)
    pub fn submit(&mut self, frame: Option<&LandmarkFrame>) -> Result<StabilizerOutput> {
        if !self.active {
            return Err(Error::SessionInactive);
        }
        Ok(self.process(frame))
    }

    /// Step until the source ends, collecting every output
    pub fn run_to_end(&mut self) -> Vec<StabilizerOutput> {
        let mut outputs = Vec::new();
        loop {
            match self.step() {
                StepOutcome::Processed(output) => outputs.push(output),
                StepOutcome::Ended | StepOutcome::Inactive => break,
            }
        }
        outputs
    }

    /// Release reactions that are due and sweep expired tokens.
    /// Returns the tokens created by this call.
    ///
    /// A token starts its life at its event's release time, not at the tick
    /// that happens to release it.
    pub fn tick(&mut self) -> Vec<EffectToken> {
        let now = self.clock.now_ms();
        let due = self
            .pending
            .iter()
            .take_while(|e| e.release_at_ms <= now)
            .count();

        let mut created = Vec::with_capacity(due);
        for event in self.pending.drain(..due) {
            let token = self.scheduler.on_reaction(&event, event.release_at_ms, &mut self.rng);
            created.push(token);
        }
        self.scheduler.sweep(now);
        created
    }

    /// Next time at which `tick` has work to do
    pub fn next_deadline_ms(&self) -> Option<u64> {
        let release = self.pending.first().map(|e| e.release_at_ms);
        match (release, self.scheduler.next_expiry_ms()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn process(&mut self, frame: Option<&LandmarkFrame>) -> StabilizerOutput {
        let now = self.clock.now_ms();
        self.frames_processed += 1;

        let classification = frame.map(|f| self.classifier.classify(f));
        let output = self.stabilizer.update(classification, now);

        if let Some(gesture) = output.confirmed {
            let burst = self.dispatcher.on_confirmed(gesture, now, &mut self.rng);
            self.pending.extend(burst);
            self.pending.sort_by_key(|e| e.release_at_ms);
        }

        self.tick();
        output
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> StabilizerState {
        self.stabilizer.state()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            active: self.active,
            state: self.stabilizer.state(),
            held_ms: self.stabilizer.held_ms(self.clock.now_ms()),
            frames_processed: self.frames_processed,
            confirmations: self.stabilizer.confirmations(),
            pending_reactions: self.pending.len(),
            live_tokens: self.scheduler.live_count(),
        }
    }

    pub fn config(&self) -> &ReactionConfig {
        &self.config
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn scheduler(&self) -> &EffectScheduler<K> {
        &self.scheduler
    }

    pub fn pending_reactions(&self) -> &[ReactionEvent] {
        &self.pending
    }

    pub fn sink(&self) -> &K {
        self.scheduler.sink()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::effects::RecordingSink;
    use crate::core::poses::canonical_frame;
    use crate::core::source::PushSource;
    use crate::types::Gesture;

    struct DeniedSource;

    impl FrameSource for DeniedSource {
        fn open(&mut self) -> Result<()> {
            Err(Error::SourceUnavailable("camera permission denied".into()))
        }

        fn next_frame(&mut self) -> FramePoll {
            FramePoll::Ended
        }
    }

    fn seeded() -> ReactionConfig {
        ReactionConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_failure_leaves_session_idle() {
        let mut session =
            ReactionSession::new(seeded(), DeniedSource, RecordingSink::new(), ManualClock::new())
                .unwrap();
        assert!(matches!(session.start(), Err(Error::SourceUnavailable(_))));
        assert!(!session.is_active());
        assert_eq!(session.state(), StabilizerState::Idle);
        assert!(matches!(session.step(), StepOutcome::Inactive));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReactionConfig {
            burst_count: 0,
            ..Default::default()
        };
        let result = ReactionSession::new(config, PushSource, RecordingSink::new(), ManualClock::new());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_submit_requires_start() {
        let mut session =
            ReactionSession::new(seeded(), PushSource, RecordingSink::new(), ManualClock::new())
                .unwrap();
        assert!(matches!(session.submit(None), Err(Error::SessionInactive)));
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let clock = ManualClock::new();
        let mut session =
            ReactionSession::new(seeded(), PushSource, RecordingSink::new(), clock.clone()).unwrap();
        session.start().unwrap();
        session.start().unwrap();

        let frame = canonical_frame(Gesture::Peace);
        session.submit(Some(&frame)).unwrap();
        assert_eq!(session.state(), StabilizerState::Tracking(Gesture::Peace));

        assert!(session.stop().is_some());
        assert!(session.stop().is_none());
        assert_eq!(session.state(), StabilizerState::Idle);
        assert!(session.stabilizer().candidate_since_ms().is_none());
    }

    #[test]
    fn test_next_deadline_tracks_pending_then_expiry() {
        let clock = ManualClock::new();
        let mut session =
            ReactionSession::new(seeded(), PushSource, RecordingSink::new(), clock.clone()).unwrap();
        session.start().unwrap();
        assert_eq!(session.next_deadline_ms(), None);

        let frame = canonical_frame(Gesture::ThumbsUp);
        session.submit(Some(&frame)).unwrap();
        clock.set(800);
        session.submit(Some(&frame)).unwrap();

        // First event released immediately, next one due 150ms later
        assert_eq!(session.next_deadline_ms(), Some(950));
        assert_eq!(session.pending_reactions().len(), 4);
    }
}
