//! Integration tests for reaction sessions
//!
//! Scripted replays on a manual clock, stagger release, expiry and lifecycle

use handsign::core::{
    canonical_frame, ChannelSource, Clock, ManualClock, ReactionConfig, ReactionSession,
    RecordingSink, ScriptedFrame, ScriptedSource, StepOutcome,
};
use handsign::types::{Gesture, StabilizerState};
use handsign::Error;
use pretty_assertions::assert_eq;

fn seeded() -> ReactionConfig {
    ReactionConfig {
        seed: Some(7),
        ..Default::default()
    }
}

fn held(gesture: Gesture, until_ms: u64, every_ms: u64) -> Vec<ScriptedFrame> {
    let frame = canonical_frame(gesture);
    (0..=until_ms)
        .step_by(every_ms as usize)
        .map(|at_ms| ScriptedFrame {
            at_ms,
            landmarks: Some(frame.clone()),
        })
        .collect()
}

#[test]
fn test_replay_releases_burst_on_stagger() {
    let clock = ManualClock::new();
    let source = ScriptedSource::new(held(Gesture::ThumbsUp, 1500, 50), clock.clone());
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();

    let outputs = session.run_to_end();
    let fired: Vec<u64> = outputs
        .iter()
        .filter(|o| o.is_confirmation())
        .map(|o| o.at_ms)
        .collect();
    assert_eq!(fired, vec![800]);
    assert!(!session.is_active());

    let created: Vec<u64> = session
        .sink()
        .rendered
        .iter()
        .map(|t| t.created_at_ms)
        .collect();
    assert_eq!(created, vec![800, 950, 1100, 1250, 1400]);
    for token in &session.sink().rendered {
        assert_eq!(token.gesture, Gesture::ThumbsUp);
    }
}

#[test]
fn test_sparse_frames_keep_stagger_spacing() {
    let config = ReactionConfig {
        effect_lifetime_min_ms: 3000,
        effect_lifetime_max_ms: 3000,
        ..seeded()
    };
    let clock = ManualClock::new();
    let source = ScriptedSource::new(held(Gesture::ThumbsUp, 1600, 400), clock.clone());
    let mut session =
        ReactionSession::new(config, source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();

    let fired: Vec<u64> = session
        .run_to_end()
        .iter()
        .filter(|o| o.is_confirmation())
        .map(|o| o.at_ms)
        .collect();
    assert_eq!(fired, vec![800, 1600]);

    // First burst only; the 1600 burst starts its own spacing
    let first: Vec<(u64, u64)> = session
        .sink()
        .rendered
        .iter()
        .take(5)
        .map(|t| (t.created_at_ms, t.expires_at_ms))
        .collect();
    assert_eq!(
        first,
        vec![(800, 3800), (950, 3950), (1100, 4100), (1250, 4250), (1400, 4400)]
    );
}

#[test]
fn test_pending_reactions_drain_after_source_ends() {
    let clock = ManualClock::new();
    // Script ends right at the confirmation
    let source = ScriptedSource::new(held(Gesture::OpenHand, 800, 100), clock.clone());
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();
    session.run_to_end();

    assert_eq!(session.sink().rendered.len(), 1);
    assert_eq!(session.pending_reactions().len(), 4);

    while let Some(deadline) = session.next_deadline_ms() {
        clock.set(deadline);
        session.tick();
    }

    assert_eq!(session.sink().rendered.len(), 5);
    assert_eq!(session.sink().released.len(), 5);
    assert_eq!(session.scheduler().live_count(), 0);
}

#[test]
fn test_tokens_sweep_exactly_at_expiry() {
    let config = ReactionConfig {
        burst_count: 1,
        effect_lifetime_min_ms: 4000,
        effect_lifetime_max_ms: 4000,
        ..seeded()
    };
    let clock = ManualClock::new();
    let source = ScriptedSource::new(held(Gesture::Peace, 800, 400), clock.clone());
    let mut session =
        ReactionSession::new(config, source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();
    session.run_to_end();

    let token = session.sink().rendered[0].clone();
    assert_eq!(token.expires_at_ms, 4800);

    clock.set(4799);
    session.tick();
    assert_eq!(session.scheduler().live_count(), 1);

    clock.set(4800);
    session.tick();
    assert_eq!(session.scheduler().live_count(), 0);
    assert_eq!(session.sink().released, vec![token.id]);
}

#[test]
fn test_three_holds_three_bursts() {
    let clock = ManualClock::new();
    let source = ScriptedSource::new(held(Gesture::Peace, 2400, 100), clock.clone());
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();
    session.run_to_end();

    while let Some(deadline) = session.next_deadline_ms() {
        clock.set(deadline);
        session.tick();
    }
    assert_eq!(session.stabilizer().confirmations(), 3);
    assert_eq!(session.sink().rendered.len(), 15);
}

#[test]
fn test_replay_from_file() {
    let path = std::env::temp_dir().join(format!("handsign-replay-{}.jsonl", std::process::id()));
    let mut text = String::from("# thumbs up, lost, thumbs up again\n");
    let frame = serde_json::to_string(&canonical_frame(Gesture::ThumbsUp)).unwrap();
    for at_ms in [0, 300, 600] {
        text.push_str(&format!("{{\"at_ms\": {}, \"landmarks\": {}}}\n", at_ms, frame));
    }
    text.push_str("{\"at_ms\": 700, \"landmarks\": null}\n");
    for at_ms in [800, 1200, 1600] {
        text.push_str(&format!("{{\"at_ms\": {}, \"landmarks\": {}}}\n", at_ms, frame));
    }
    std::fs::write(&path, text).unwrap();

    let clock = ManualClock::new();
    let source = ScriptedSource::from_path(&path, clock.clone());
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();
    let outputs = session.run_to_end();
    std::fs::remove_file(&path).ok();

    assert_eq!(outputs.len(), 7);
    assert_eq!(outputs[3].state, StabilizerState::Idle);
    let fired: Vec<u64> = outputs
        .iter()
        .filter(|o| o.is_confirmation())
        .map(|o| o.at_ms)
        .collect();
    assert_eq!(fired, vec![1600]);
}

#[test]
fn test_bad_script_fails_start() {
    let path = std::env::temp_dir().join(format!("handsign-bad-{}.jsonl", std::process::id()));
    std::fs::write(&path, "{\"at_ms\": 0}\nnot json\n").unwrap();

    let clock = ManualClock::new();
    let source = ScriptedSource::from_path(&path, clock.clone());
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock).unwrap();
    let result = session.start();
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(Error::SourceUnavailable(ref m)) if m.contains("line 2")));
    assert!(!session.is_active());
    assert_eq!(session.state(), StabilizerState::Idle);
}

#[test]
fn test_stop_mid_hold_resets() {
    let (tx, source) = ChannelSource::channel();
    let clock = ManualClock::new();
    let mut session =
        ReactionSession::new(seeded(), source, RecordingSink::new(), clock.clone()).unwrap();
    session.start().unwrap();

    let frame = canonical_frame(Gesture::ThumbsUp);
    tx.send(Some(frame.clone()));
    assert!(matches!(session.step(), StepOutcome::Processed(_)));
    clock.set(600);
    tx.send(Some(frame.clone()));
    session.step();
    assert_eq!(session.state(), StabilizerState::Tracking(Gesture::ThumbsUp));

    let stopped = session.stop().unwrap();
    assert_eq!(stopped.state, StabilizerState::Idle);
    assert!(matches!(session.step(), StepOutcome::Inactive));
    assert_eq!(clock.now_ms(), 600);
}

#[test]
fn test_sessions_are_independent() {
    let clock_a = ManualClock::new();
    let clock_b = ManualClock::new();
    let source_a = ScriptedSource::new(held(Gesture::Peace, 900, 100), clock_a.clone());
    let source_b = ScriptedSource::new(held(Gesture::OpenHand, 300, 100), clock_b.clone());
    let mut a = ReactionSession::new(seeded(), source_a, RecordingSink::new(), clock_a).unwrap();
    let mut b = ReactionSession::new(seeded(), source_b, RecordingSink::new(), clock_b).unwrap();
    a.start().unwrap();
    b.start().unwrap();
    a.run_to_end();
    b.run_to_end();

    assert_eq!(a.stabilizer().confirmations(), 1);
    assert_eq!(b.stabilizer().confirmations(), 0);
}
