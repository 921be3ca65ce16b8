// src/pipeline/event_bus.rs
//
// Notifications the engine raises while processing a frame. The host
// drains them after each tick instead of diffing snapshots.

use super::event_log::EventLogEntry;
use crate::types::Gesture;
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Unlocked {
        frame_id: u64,
        timestamp: f64,
        gesture: Gesture,
    },

    LockReleased {
        frame_id: u64,
        gesture: Gesture,
    },

    GestureLogged(EventLogEntry),

    TrainingHit {
        target: String,
        score: u32,
        next_target: Option<String>,
    },

    HandsLost {
        frame_id: u64,
    },
}

/// Bounded queue between the engine and the host loop. When the host
/// falls behind, the oldest notifications go first.
pub struct EventBus {
    queue: VecDeque<EngineEvent>,
    limit: usize,
    dropped: u64,
}

impl EventBus {
    pub fn new(limit: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(limit),
            limit,
            dropped: 0,
        }
    }

    pub fn publish(&mut self, event: EngineEvent) {
        if self.queue.len() >= self.limit {
            // Warn once per drain cycle.
            if self.dropped == 0 {
                warn!("Event bus full ({} pending), dropping oldest", self.limit);
            }
            self.dropped += 1;
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    /// Take everything queued so far and start a new drop count.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        if self.dropped > 0 {
            debug!("{} engine event(s) were dropped since last drain", self.dropped);
            self.dropped = 0;
        }
        self.queue.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
