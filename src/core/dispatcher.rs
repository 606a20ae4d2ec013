//! Reaction Dispatcher: one confirmation → a staggered burst of events

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::core::config::ReactionConfig;
use crate::types::{Gesture, ReactionEvent};

/// Turns confirmations into reaction bursts
#[derive(Debug, Clone)]
pub struct ReactionDispatcher {
    burst_count: usize,
    stagger_ms: u64,
}

impl ReactionDispatcher {
    pub fn new(burst_count: usize, stagger_ms: u64) -> Self {
        Self {
            burst_count,
            stagger_ms,
        }
    }

    pub fn from_config(config: &ReactionConfig) -> Self {
        Self::new(config.burst_count, config.stagger_interval_ms)
    }

    /// Build the burst for a confirmation at `fired_at_ms`.
    ///
    /// Event `i` is released at `fired_at_ms + i * stagger`; each picks its
    /// own symbol. `Gesture::None` yields an empty burst.
    pub fn on_confirmed<R: Rng + ?Sized>(
        &self,
        gesture: Gesture,
        fired_at_ms: u64,
        rng: &mut R,
    ) -> Vec<ReactionEvent> {
        let symbols = gesture.symbols();
        if symbols.is_empty() {
            return Vec::new();
        }

        let mut burst = Vec::with_capacity(self.burst_count);
        for index in 0..self.burst_count {
            let offset = self.stagger_ms.saturating_mul(index as u64);
            let Some(symbol) = symbols.choose(&mut *rng) else {
                continue;
            };
            burst.push(ReactionEvent {
                gesture,
                fired_at_ms,
                index,
                release_at_ms: fired_at_ms.saturating_add(offset),
                symbol: (*symbol).to_string(),
            });
        }

        debug!(
            "Burst for {}: {} events over {}ms",
            gesture,
            burst.len(),
            self.stagger_ms.saturating_mul(self.burst_count.saturating_sub(1) as u64)
        );
        burst
    }
}

impl Default for ReactionDispatcher {
    fn default() -> Self {
        Self::from_config(&ReactionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_burst_of_five_staggered() {
        let dispatcher = ReactionDispatcher::default();
        let mut rng = StdRng::seed_from_u64(1);
        let burst = dispatcher.on_confirmed(Gesture::ThumbsUp, 800, &mut rng);

        assert_eq!(burst.len(), 5);
        let releases: Vec<u64> = burst.iter().map(|e| e.release_at_ms).collect();
        assert_eq!(releases, vec![800, 950, 1100, 1250, 1400]);
        for (i, event) in burst.iter().enumerate() {
            assert_eq!(event.index, i);
            assert_eq!(event.fired_at_ms, 800);
            assert_eq!(event.gesture, Gesture::ThumbsUp);
        }
    }

    #[test]
    fn test_symbols_come_from_gesture_set() {
        let dispatcher = ReactionDispatcher::new(50, 10);
        let mut rng = StdRng::seed_from_u64(9);
        for gesture in Gesture::RECOGNIZED {
            for event in dispatcher.on_confirmed(gesture, 0, &mut rng) {
                assert!(gesture.symbols().contains(&event.symbol.as_str()));
            }
        }
    }

    #[test]
    fn test_symbols_vary() {
        let dispatcher = ReactionDispatcher::new(100, 0);
        let mut rng = StdRng::seed_from_u64(3);
        let burst = dispatcher.on_confirmed(Gesture::Peace, 0, &mut rng);
        let first = &burst[0].symbol;
        assert!(burst.iter().any(|e| &e.symbol != first));
    }

    #[test]
    fn test_release_times_saturate() {
        let dispatcher = ReactionDispatcher::new(3, u64::MAX);
        let mut rng = StdRng::seed_from_u64(1);
        let releases: Vec<u64> = dispatcher
            .on_confirmed(Gesture::OpenHand, 10, &mut rng)
            .iter()
            .map(|e| e.release_at_ms)
            .collect();
        assert_eq!(releases, vec![10, u64::MAX, u64::MAX]);
    }

    #[test]
    fn test_none_yields_no_events() {
        let dispatcher = ReactionDispatcher::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(dispatcher.on_confirmed(Gesture::None, 0, &mut rng).is_empty());
    }
}
