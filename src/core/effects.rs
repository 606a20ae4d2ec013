//! Effect Scheduler: reaction events → self-expiring effect tokens
//!
//! Every token carries its own expiry; `sweep` releases whatever is due.
//! The sink only ever receives tokens and release notices.

use rand::Rng;
use serde::Serialize;
use std::io::Write;
use tokio::sync::broadcast;
use tracing::{info, trace, warn};

use crate::core::config::ReactionConfig;
use crate::types::{EffectToken, Position, ReactionEvent, TokenId};

// =============================================================================
// SINKS
// =============================================================================

/// Presentation side of the pipeline
pub trait EffectSink {
    /// A new token should appear
    fn render(&mut self, token: &EffectToken);

    /// A token's lifetime ended
    fn release(&mut self, _id: TokenId) {}
}

impl<T: EffectSink + ?Sized> EffectSink for &mut T {
    fn render(&mut self, token: &EffectToken) {
        (**self).render(token)
    }

    fn release(&mut self, id: TokenId) {
        (**self).release(id)
    }
}

impl<T: EffectSink + ?Sized> EffectSink for Box<T> {
    fn render(&mut self, token: &EffectToken) {
        (**self).render(token)
    }

    fn release(&mut self, id: TokenId) {
        (**self).release(id)
    }
}

/// Keeps everything it is given (tests, replays)
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub rendered: Vec<EffectToken>,
    pub released: Vec<TokenId>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EffectSink for RecordingSink {
    fn render(&mut self, token: &EffectToken) {
        self.rendered.push(token.clone());
    }

    fn release(&mut self, id: TokenId) {
        self.released.push(id);
    }
}

/// Logs tokens through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EffectSink for LogSink {
    fn render(&mut self, token: &EffectToken) {
        info!(
            "{} {} {} at x={:.2} size={:.0}px rot={:.0}° for {}ms",
            token.id, token.symbol, token.gesture, token.position.x, token.size_px,
            token.rotation_deg, token.duration_ms
        );
    }

    fn release(&mut self, id: TokenId) {
        trace!("{} released", id);
    }
}

/// One line of JSON per sink call
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum SinkRecord<'a> {
    Render { token: &'a EffectToken },
    Release { id: TokenId },
}

/// Writes render/release records as JSON lines
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn emit(&mut self, record: &SinkRecord<'_>) {
        let written = serde_json::to_string(record)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(self.writer, "{}", line))
            .and_then(|_| self.writer.flush());
        if let Err(e) = written {
            warn!("Effect sink write failed: {}", e);
        }
    }
}

impl<W: Write> EffectSink for JsonLinesSink<W> {
    fn render(&mut self, token: &EffectToken) {
        self.emit(&SinkRecord::Render { token });
    }

    fn release(&mut self, id: TokenId) {
        self.emit(&SinkRecord::Release { id });
    }
}

/// Fans tokens out to any number of subscribers (WebSocket clients)
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<EffectToken>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EffectToken> {
        self.tx.subscribe()
    }
}

impl EffectSink for BroadcastSink {
    fn render(&mut self, token: &EffectToken) {
        // No subscribers is fine
        let _ = self.tx.send(token.clone());
    }
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Owns live tokens until they expire
#[derive(Debug)]
pub struct EffectScheduler<K: EffectSink> {
    sink: K,
    /// Ordered by id
    live: Vec<EffectToken>,
    next_id: u64,
    lifetime_ms: (u64, u64),
    size_px: (f32, f32),
    rotation_deg: f32,
}

impl<K: EffectSink> EffectScheduler<K> {
    pub fn new(sink: K, config: &ReactionConfig) -> Self {
        Self {
            sink,
            live: Vec::new(),
            next_id: 1,
            lifetime_ms: (config.effect_lifetime_min_ms, config.effect_lifetime_max_ms),
            size_px: (config.effect_size_min_px, config.effect_size_max_px),
            rotation_deg: config.effect_rotation_deg,
        }
    }

    /// Create, render and track one token for `event`
    pub fn on_reaction<R: Rng + ?Sized>(
        &mut self,
        event: &ReactionEvent,
        now_ms: u64,
        rng: &mut R,
    ) -> EffectToken {
        let id = TokenId(self.next_id);
        self.next_id += 1;

        let duration_ms = rng.gen_range(self.lifetime_ms.0..=self.lifetime_ms.1);
        let token = EffectToken {
            id,
            gesture: event.gesture,
            symbol: event.symbol.clone(),
            // Rises from the bottom edge
            position: Position {
                x: rng.gen_range(0.0..=1.0),
                y: 1.0,
            },
            size_px: rng.gen_range(self.size_px.0..=self.size_px.1),
            rotation_deg: rng.gen_range(-self.rotation_deg..=self.rotation_deg),
            duration_ms,
            created_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(duration_ms),
        };

        trace!("{} created, expires at {}ms", token.id, token.expires_at_ms);
        self.sink.render(&token);
        self.live.push(token.clone());
        token
    }

    /// Release every token whose expiry has passed
    pub fn sweep(&mut self, now_ms: u64) -> Vec<TokenId> {
        let mut released = Vec::new();
        self.live.retain(|token| {
            if token.is_expired(now_ms) {
                released.push(token.id);
                false
            } else {
                true
            }
        });
        for id in &released {
            self.sink.release(*id);
        }
        if !released.is_empty() {
            trace!("Swept {} tokens at {}ms", released.len(), now_ms);
        }
        released
    }

    pub fn live_tokens(&self) -> &[EffectToken] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Earliest pending expiry, if any token is live
    pub fn next_expiry_ms(&self) -> Option<u64> {
        self.live.iter().map(|t| t.expires_at_ms).min()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}
