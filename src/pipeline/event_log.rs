// src/pipeline/event_log.rs
//
// Rolling, newest-first log of authoritative gesture changes. A write
// needs a non-NONE gesture that differs from the last *logged* one and a
// cooldown since the previous write.

use crate::clock::Cooldown;
use crate::types::Gesture;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogEntry {
    /// Wall-clock label for display.
    pub time: String,
    /// Engine clock seconds.
    pub timestamp: f64,
    pub gesture: Gesture,
    /// Rounded to two decimals.
    pub confidence: f32,
}

pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
    cooldown: Cooldown,
    last_logged: Option<Gesture>,
}

impl EventLog {
    pub fn new(capacity: usize, cooldown_secs: f64) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cooldown: Cooldown::inclusive(cooldown_secs),
            last_logged: None,
        }
    }

    /// Returns the new entry when one was written.
    pub fn record(
        &mut self,
        gesture: Gesture,
        confidence: f32,
        now: f64,
        time: impl FnOnce() -> String,
    ) -> Option<&EventLogEntry> {
        if gesture == Gesture::None
            || self.last_logged == Some(gesture)
            || !self.cooldown.is_ready(now)
        {
            return None;
        }

        let entry = EventLogEntry {
            time: time(),
            timestamp: now,
            gesture,
            confidence: round2(confidence),
        };
        info!("📝 Logged {} ({:.2})", entry.gesture, entry.confidence);

        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        self.last_logged = Some(gesture);
        self.cooldown.trigger(now);
        self.entries.front()
    }

    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
