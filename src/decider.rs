// Magic Wand — Gesture Decision Policy
//
// Turns one score vector into at most one gesture event:
//   1. argmax over the scores (ties → lowest class index)
//   2. no-gesture winner, or winner below the threshold → none
//   3. inside the refractory period of the last trigger → none (suppressed)
//   4. otherwise emit the winner and remember the tick

use crate::config::DeciderConfig;
use crate::events::{GestureClass, GestureEvent, ScoreVector};

pub struct GestureDecider {
    config: DeciderConfig,
    /// Tick of the last emitted (non-none) gesture.
    last_trigger_tick: Option<u64>,
}

impl GestureDecider {
    pub fn new(config: DeciderConfig) -> Self {
        Self {
            config,
            last_trigger_tick: None,
        }
    }

    pub fn config(&self) -> &DeciderConfig {
        &self.config
    }

    pub fn last_trigger_tick(&self) -> Option<u64> {
        self.last_trigger_tick
    }

    /// True while a previous trigger still blocks new ones at `tick`.
    pub fn in_refractory(&self, tick: u64) -> bool {
        self.last_trigger_tick
            .is_some_and(|last| tick.saturating_sub(last) < u64::from(self.config.refractory_ticks()))
    }

    pub fn decide(&mut self, scores: &ScoreVector, tick: u64) -> GestureEvent {
        let (winner, max_score) = scores.argmax();

        // NaN fails this comparison and is treated as below threshold.
        if winner == GestureClass::NoGesture || !(max_score >= self.config.confidence_threshold()) {
            return GestureEvent::none(tick);
        }

        if self.in_refractory(tick) {
            log::debug!(
                "Suppressed {} ({:.2}) at tick {} — refractory since tick {:?}",
                winner.label(),
                max_score,
                tick,
                self.last_trigger_tick
            );
            return GestureEvent::none(tick);
        }

        self.last_trigger_tick = Some(tick);
        GestureEvent {
            gesture: Some(winner),
            confidence: max_score,
            tick,
        }
    }

    /// Clear refractory state (system restart).
    pub fn reset(&mut self) {
        self.last_trigger_tick = None;
    }
}
