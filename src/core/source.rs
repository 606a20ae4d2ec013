//! Landmark frame sources
//!
//! A source is pulled once per tick and answers with a frame, nothing
//! (no hand this tick), or end-of-stream.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::clock::ManualClock;
use crate::error::{Error, Result};
use crate::types::LandmarkFrame;

/// Result of pulling a source once
#[derive(Debug, Clone, PartialEq)]
pub enum FramePoll {
    Frame(LandmarkFrame),
    /// Nothing this tick; treated as "no hand"
    Empty,
    /// The source is exhausted
    Ended,
}

/// Pull-based landmark provider
pub trait FrameSource {
    /// Acquire the underlying input. Called by `start()`.
    fn open(&mut self) -> Result<()>;

    fn next_frame(&mut self) -> FramePoll;

    /// Release the input. Called by `stop()`.
    fn close(&mut self) {}
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn next_frame(&mut self) -> FramePoll {
        (**self).next_frame()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

// =============================================================================
// SCRIPTED REPLAY
// =============================================================================

/// One line of a replay script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedFrame {
    /// Capture time (milliseconds from script start)
    pub at_ms: u64,
    /// Missing or null: no hand in this frame
    #[serde(default)]
    pub landmarks: Option<LandmarkFrame>,
}

/// Parse JSON-lines replay text. Blank lines and `#` comments are skipped;
/// timestamps must not decrease.
pub fn parse_script(text: &str) -> Result<Vec<ScriptedFrame>> {
    let mut frames: Vec<ScriptedFrame> = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame: ScriptedFrame = serde_json::from_str(line).map_err(|e| Error::InvalidScript {
            line: i + 1,
            reason: e.to_string(),
        })?;
        if let Some(prev) = frames.last() {
            if frame.at_ms < prev.at_ms {
                return Err(Error::InvalidScript {
                    line: i + 1,
                    reason: format!("at_ms {} is earlier than {}", frame.at_ms, prev.at_ms),
                });
            }
        }
        frames.push(frame);
    }
    Ok(frames)
}

#[derive(Debug, Clone)]
enum ScriptOrigin {
    Inline,
    File(PathBuf),
}

/// Replays recorded frames, moving a manual clock to each capture time
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    origin: ScriptOrigin,
    frames: Vec<ScriptedFrame>,
    cursor: usize,
    clock: ManualClock,
}

impl ScriptedSource {
    pub fn new(frames: Vec<ScriptedFrame>, clock: ManualClock) -> Self {
        Self {
            origin: ScriptOrigin::Inline,
            frames,
            cursor: 0,
            clock,
        }
    }

    /// Script read from disk when the session starts
    pub fn from_path(path: impl AsRef<Path>, clock: ManualClock) -> Self {
        Self {
            origin: ScriptOrigin::File(path.as_ref().to_path_buf()),
            frames: Vec::new(),
            cursor: 0,
            clock,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        if let ScriptOrigin::File(path) = &self.origin {
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::SourceUnavailable(format!("{}: {}", path.display(), e))
            })?;
            self.frames = parse_script(&text)?;
            self.cursor = 0;
            info!("Loaded {} frames from {}", self.frames.len(), path.display());
        }
        Ok(())
    }

    fn next_frame(&mut self) -> FramePoll {
        let Some(scripted) = self.frames.get(self.cursor) else {
            return FramePoll::Ended;
        };
        self.cursor += 1;
        self.clock.set(scripted.at_ms);
        match &scripted.landmarks {
            Some(frame) => FramePoll::Frame(frame.clone()),
            None => FramePoll::Empty,
        }
    }
}

// =============================================================================
// CHANNEL (LIVE)
// =============================================================================

/// Producer half of a [`ChannelSource`]. `None` reports a frame without a hand.
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<Option<LandmarkFrame>>,
}

impl FrameSender {
    /// Queue a frame; `false` once the source is gone
    pub fn send(&self, frame: Option<LandmarkFrame>) -> bool {
        self.tx.send(frame).is_ok()
    }
}

/// Frames pushed from another task, pulled one per tick
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Option<LandmarkFrame>>,
}

impl ChannelSource {
    pub fn channel() -> (FrameSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (FrameSender { tx }, Self { rx })
    }
}

impl FrameSource for ChannelSource {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> FramePoll {
        match self.rx.try_recv() {
            Ok(Some(frame)) => FramePoll::Frame(frame),
            Ok(None) => FramePoll::Empty,
            Err(mpsc::error::TryRecvError::Empty) => FramePoll::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                debug!("Frame channel closed");
                FramePoll::Ended
            }
        }
    }

    fn close(&mut self) {
        self.rx.close();
    }
}

// =============================================================================
// PUSHED (API)
// =============================================================================

/// Placeholder for sessions whose frames arrive through `submit()`
#[derive(Debug, Default, Clone, Copy)]
pub struct PushSource;

impl FrameSource for PushSource {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_frame(&mut self) -> FramePoll {
        FramePoll::Empty
    }
}
