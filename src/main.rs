//! Handsign CLI
//!
//! Usage:
//!   handsign --replay frames.jsonl             # Replay a recorded script
//!   handsign --demo thumbs_up --duration 3s    # Hold a canonical pose
//!   handsign --stdin < live.jsonl              # Live frames, paced in real time
//!   handsign --serve                           # HTTP API server
//!   handsign --replay frames.jsonl --json      # JSON output

use clap::Parser;
use serde::Deserialize;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use handsign::core::{
    canonical_frame, parse_duration_ms, run_server, ChannelSource, Clock, EffectSink,
    JsonLinesSink, LogSink, ManualClock, ReactionConfig, ReactionSession, ScriptedFrame,
    ScriptedSource, StepOutcome, SystemClock,
};
use handsign::types::{Gesture, LandmarkFrame, StabilizerOutput};
use handsign::{Result, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "handsign",
    version = VERSION,
    about = "Handsign - Turn held hand gestures into bursts of on-screen reactions",
    long_about = "Handsign classifies hand-landmark frames into gestures, waits until a\n\
                  gesture has been held confidently, and then releases a staggered\n\
                  burst of floating reaction effects.\n\n\
                  Modes:\n  \
                  --replay FILE  Replay a JSON-lines landmark script\n  \
                  --demo GESTURE Hold the canonical pose for a gesture\n  \
                  --stdin        Live JSON-lines frames from stdin\n  \
                  --serve        HTTP API server mode\n\n\
                  Gestures:\n  \
                  thumbs_up  👍\n  \
                  peace      ✌️\n  \
                  open_hand  👋"
)]
struct Args {
    /// Replay a JSON-lines script ({"at_ms": 0, "landmarks": [[x,y,z], ...]})
    #[arg(short, long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Feed the canonical pose of a gesture
    #[arg(short, long, value_name = "GESTURE")]
    demo: Option<String>,

    /// How long the demo pose is held
    #[arg(long, default_value = "3s")]
    duration: String,

    /// Read live frames from stdin ({"landmarks": [...] | null} per line)
    #[arg(long)]
    stdin: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum confidence to count as holding a gesture
    #[arg(long)]
    threshold: Option<f32>,

    /// Hold duration before a gesture fires (e.g. 800, 800ms, 0.8s)
    #[arg(long)]
    hold: Option<String>,

    /// Gap between reactions of one burst
    #[arg(long)]
    stagger: Option<String>,

    /// Seed for reproducible effects
    #[arg(long)]
    seed: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// One line on stdin in live mode
#[derive(Debug, Deserialize)]
struct LiveFrame {
    #[serde(default)]
    landmarks: Option<LandmarkFrame>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "handsign=debug" } else { "handsign=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<()> {
    if args.serve {
        return run_serve(args).await;
    }

    let config = build_config(args)?;
    if let Some(ref path) = args.replay {
        run_replay(path, config, args)
    } else if let Some(ref gesture) = args.demo {
        let gesture: Gesture = gesture.parse()?;
        let duration_ms = parse_duration_ms(&args.duration)?;
        run_demo(gesture, duration_ms, config, args)
    } else if args.stdin {
        run_stdin(config).await
    } else {
        // Default to a short thumbs-up demo if no mode specified
        run_demo(Gesture::ThumbsUp, 2 * config.hold_duration_ms, config, args)
    }
}

/// Config file, then flag overrides, then validation
fn build_config(args: &Args) -> Result<ReactionConfig> {
    let mut config = match args.config {
        Some(ref path) => ReactionConfig::load(path)?,
        None => ReactionConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(ref hold) = args.hold {
        config.hold_duration_ms = parse_duration_ms(hold)?;
    }
    if let Some(ref stagger) = args.stagger {
        config.stagger_interval_ms = parse_duration_ms(stagger)?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Run a recorded script on a manual clock
fn run_replay(path: &Path, config: ReactionConfig, args: &Args) -> Result<()> {
    let clock = ManualClock::new();
    let source = ScriptedSource::from_path(path, clock.clone());
    print_header(&format!("Replay: {}", path.display()), args);
    run_scripted(source, clock, config, args)
}

/// Hold the canonical pose for `duration_ms`, one frame per frame interval
fn run_demo(gesture: Gesture, duration_ms: u64, config: ReactionConfig, args: &Args) -> Result<()> {
    let clock = ManualClock::new();
    let frame = canonical_frame(gesture);
    let step = config.frame_interval_ms as usize;
    let frames = (0..=duration_ms)
        .step_by(step)
        .map(|at_ms| ScriptedFrame {
            at_ms,
            landmarks: Some(frame.clone()),
        })
        .collect();
    let source = ScriptedSource::new(frames, clock.clone());
    print_header(&format!("Demo: {} for {}ms", gesture, duration_ms), args);
    run_scripted(source, clock, config, args)
}

fn run_scripted(
    source: ScriptedSource,
    clock: ManualClock,
    config: ReactionConfig,
    args: &Args,
) -> Result<()> {
    let sink: Box<dyn EffectSink> = if args.json {
        Box::new(JsonLinesSink::new(io::stdout()))
    } else {
        Box::new(LogSink)
    };
    let mut session = ReactionSession::new(config, source, sink, clock.clone())?;
    session.start()?;

    while let StepOutcome::Processed(output) = session.step() {
        print_output(&output, args);
    }

    // Let every scheduled reaction play out
    while let Some(deadline) = session.next_deadline_ms() {
        clock.set(deadline);
        session.tick();
    }

    let status = session.status();
    if !args.json {
        println!();
        println!(
            "Session ended. Frames: {} | Confirmations: {}",
            status.frames_processed, status.confirmations
        );
    }
    Ok(())
}

/// Live frames from stdin, one pulled per frame interval
async fn run_stdin(config: ReactionConfig) -> Result<()> {
    let (tx, source) = ChannelSource::channel();
    let interval = Duration::from_millis(config.frame_interval_ms);

    // Plain thread: a blocked stdin read must not hold up shutdown
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for (i, line) in stdin.lock().lines().enumerate() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match serde_json::from_str::<LiveFrame>(line) {
                Ok(frame) => {
                    if !tx.send(frame.landmarks) {
                        break;
                    }
                }
                Err(e) => warn!("Skipping stdin line {}: {}", i + 1, e),
            }
        }
    });

    let mut session = ReactionSession::new(
        config,
        source,
        JsonLinesSink::new(io::stdout()),
        SystemClock::new(),
    )?;
    session.start()?;
    info!("Reading frames from stdin every {}ms", interval.as_millis());

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                session.stop();
                return Ok(());
            }
        }
        match session.step() {
            StepOutcome::Processed(_) => {}
            StepOutcome::Ended | StepOutcome::Inactive => break,
        }
    }

    while let Some(deadline) = session.next_deadline_ms() {
        let now = session.clock().now_ms();
        tokio::time::sleep(Duration::from_millis(deadline.saturating_sub(now))).await;
        session.tick();
    }
    Ok(())
}

/// Run HTTP API server
async fn run_serve(args: &Args) -> Result<()> {
    print_header("API Server", args);
    run_server(&args.addr).await
}

fn print_header(mode: &str, args: &Args) {
    if args.json {
        return;
    }
    println!("Handsign v{} - {}", VERSION, mode);
    println!();
}

fn print_output(output: &StabilizerOutput, args: &Args) {
    if args.json {
        match serde_json::to_string(output) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Could not serialize output: {}", e),
        }
    } else if args.no_color {
        println!("{}", output.to_parseable_string());
    } else {
        println!("{}", output.to_terminal_string());
    }
}
