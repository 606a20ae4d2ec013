//! Tunable parameters for a reaction session
//!
//! Loaded from JSON, overridden from the command line, validated before use.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::{
    DEFAULT_BURST_COUNT, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_EFFECT_LIFETIME_MAX_MS,
    DEFAULT_EFFECT_LIFETIME_MIN_MS, DEFAULT_EFFECT_ROTATION_DEG, DEFAULT_EFFECT_SIZE_MAX_PX,
    DEFAULT_EFFECT_SIZE_MIN_PX, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_HOLD_DURATION_MS,
    DEFAULT_STAGGER_INTERVAL_MS, MAX_BURST_COUNT, MAX_EFFECT_LIFETIME_MS, MAX_FRAME_INTERVAL_MS,
    MAX_HOLD_DURATION_MS, MAX_STAGGER_INTERVAL_MS,
};

lazy_static! {
    /// `800`, `800ms`, `0.8s`, `1.5 s`
    static ref RE_DURATION: Regex = Regex::new(
        r"(?i)^\s*(\d+(?:\.\d+)?)\s*(ms|s)?\s*$"
    ).unwrap();
}

/// Everything a session can be tuned with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Confidence a classification must exceed to count toward a hold
    pub confidence_threshold: f32,
    /// Hold before confirmation, and re-fire interval while held
    pub hold_duration_ms: u64,
    /// Reaction events per confirmation
    pub burst_count: usize,
    /// Gap between events of one burst
    pub stagger_interval_ms: u64,
    pub effect_lifetime_min_ms: u64,
    pub effect_lifetime_max_ms: u64,
    pub effect_size_min_px: f32,
    pub effect_size_max_px: f32,
    /// Tokens are tilted within ±this many degrees
    pub effect_rotation_deg: f32,
    /// Live-mode pacing between frame pulls
    pub frame_interval_ms: u64,
    /// Fixed RNG seed for reproducible effects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            hold_duration_ms: DEFAULT_HOLD_DURATION_MS,
            burst_count: DEFAULT_BURST_COUNT,
            stagger_interval_ms: DEFAULT_STAGGER_INTERVAL_MS,
            effect_lifetime_min_ms: DEFAULT_EFFECT_LIFETIME_MIN_MS,
            effect_lifetime_max_ms: DEFAULT_EFFECT_LIFETIME_MAX_MS,
            effect_size_min_px: DEFAULT_EFFECT_SIZE_MIN_PX,
            effect_size_max_px: DEFAULT_EFFECT_SIZE_MAX_PX,
            effect_rotation_deg: DEFAULT_EFFECT_ROTATION_DEG,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            seed: None,
        }
    }
}

impl ReactionConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and orderings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if !(1..=MAX_HOLD_DURATION_MS).contains(&self.hold_duration_ms) {
            return Err(Error::InvalidConfig(format!(
                "hold_duration_ms must be in 1..={}",
                MAX_HOLD_DURATION_MS
            )));
        }
        if !(1..=MAX_BURST_COUNT).contains(&self.burst_count) {
            return Err(Error::InvalidConfig(format!(
                "burst_count must be in 1..={}",
                MAX_BURST_COUNT
            )));
        }
        if self.stagger_interval_ms > MAX_STAGGER_INTERVAL_MS {
            return Err(Error::InvalidConfig(format!(
                "stagger_interval_ms must be <= {}",
                MAX_STAGGER_INTERVAL_MS
            )));
        }
        if self.effect_lifetime_min_ms == 0
            || self.effect_lifetime_min_ms > self.effect_lifetime_max_ms
            || self.effect_lifetime_max_ms > MAX_EFFECT_LIFETIME_MS
        {
            return Err(Error::InvalidConfig(format!(
                "effect lifetime range {}..{}ms must be non-empty and within 1..={}",
                self.effect_lifetime_min_ms, self.effect_lifetime_max_ms, MAX_EFFECT_LIFETIME_MS
            )));
        }
        if !(self.effect_size_min_px > 0.0 && self.effect_size_min_px <= self.effect_size_max_px) {
            return Err(Error::InvalidConfig(format!(
                "effect size range {}..{}px is empty",
                self.effect_size_min_px, self.effect_size_max_px
            )));
        }
        if !(self.effect_rotation_deg.is_finite() && self.effect_rotation_deg >= 0.0) {
            return Err(Error::InvalidConfig(
                "effect_rotation_deg must be a non-negative number".into(),
            ));
        }
        if !(1..=MAX_FRAME_INTERVAL_MS).contains(&self.frame_interval_ms) {
            return Err(Error::InvalidConfig(format!(
                "frame_interval_ms must be in 1..={}",
                MAX_FRAME_INTERVAL_MS
            )));
        }
        Ok(())
    }
}

/// Parse a duration flag into milliseconds.
///
/// Bare numbers are milliseconds.
pub fn parse_duration_ms(text: &str) -> Result<u64> {
    let caps = RE_DURATION
        .captures(text)
        .ok_or_else(|| Error::InvalidDuration(text.to_string()))?;
    let value: f64 = caps[1]
        .parse()
        .map_err(|_| Error::InvalidDuration(text.to_string()))?;
    let unit = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
    let ms = match unit.as_deref() {
        Some("s") => value * 1000.0,
        _ => value,
    };
    Ok(ms.round() as u64)
}
