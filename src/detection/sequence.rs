// src/detection/sequence.rs
//
// Unlock sequence detector. Runs on the raw per-frame label so it reacts
// faster than the majority-vote window:
//   raw label -> N-frame debounce (edge) -> action buffer -> trailing match

use crate::clock::Cooldown;
use crate::types::{EngineConfig, Gesture};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Consecutive-frame counter for the current raw candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilityCounter {
    pub candidate: Gesture,
    pub count: u32,
}

impl StabilityCounter {
    fn observe(&mut self, gesture: Gesture) -> u32 {
        if gesture == self.candidate {
            self.count = self.count.saturating_add(1);
        } else {
            self.candidate = gesture;
            self.count = 1;
        }
        self.count
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Emitted on the frame a full sequence is matched outside the cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unlock {
    pub timestamp: f64,
}

pub struct SequenceDetector {
    sequence: Vec<Gesture>,
    stable_frames: u32,
    action_capacity: usize,

    counter: StabilityCounter,
    actions: VecDeque<Gesture>,

    action_gap: Cooldown,
    unlock_cooldown: Cooldown,
}

impl SequenceDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            sequence: config.unlock_sequence.clone(),
            stable_frames: config.stable_frames,
            action_capacity: config.action_capacity,
            counter: StabilityCounter::default(),
            actions: VecDeque::with_capacity(config.action_capacity),
            action_gap: Cooldown::strict(config.action_gap_secs),
            unlock_cooldown: Cooldown::strict(config.unlock_cooldown_secs),
        }
    }

    pub fn observe(&mut self, raw: Gesture, now: f64) -> Option<Unlock> {
        if !raw.is_sequence_action() {
            self.counter.reset();
            return None;
        }

        // Edge-triggered: only the frame that reaches the threshold counts.
        if self.counter.observe(raw) != self.stable_frames {
            return None;
        }

        if !self.action_gap.is_ready(now) {
            debug!(
                "Action {} debounced but too soon after previous ({:.2}s)",
                raw,
                self.action_gap.elapsed(now).unwrap_or_default()
            );
            return None;
        }

        self.push_action(raw, now);

        if !self.trailing_match() {
            return None;
        }

        if !self.unlock_cooldown.is_ready(now) {
            debug!("Unlock sequence matched inside cooldown, ignoring");
            return None;
        }

        info!("🔓 Unlock sequence {:?} matched", self.sequence);
        self.unlock_cooldown.trigger(now);
        self.actions.clear();
        self.counter.count = 0;
        Some(Unlock { timestamp: now })
    }

    fn push_action(&mut self, action: Gesture, now: f64) {
        self.actions.push_back(action);
        if self.actions.len() > self.action_capacity {
            self.actions.pop_front();
        }
        self.action_gap.trigger(now);
        debug!("Action accepted: {} (buffer={:?})", action, self.actions);
    }

    fn trailing_match(&self) -> bool {
        let n = self.sequence.len();
        self.actions.len() >= n
            && self
                .actions
                .iter()
                .skip(self.actions.len() - n)
                .eq(self.sequence.iter())
    }

    /// Hand lost: drop buffered actions and the debounce state.
    /// Cooldown timestamps are kept.
    pub fn reset(&mut self) {
        self.actions.clear();
        self.counter.reset();
    }

    pub fn actions(&self) -> Vec<Gesture> {
        self.actions.iter().copied().collect()
    }

    pub fn counter(&self) -> StabilityCounter {
        self.counter
    }
}
