// src/detection/state_lock.rs
//
// Merges every per-frame source into the one authoritative gesture.
// Precedence, highest first:
//   special lock > HANDS_UP/TEAM_READY > HELP > stabilized label > NONE

use super::composite::Resolution;
use crate::clock::Expiring;
use crate::types::Gesture;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Lock,
    Composite,
    Help,
    Smoothed,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arbitration {
    pub gesture: Gesture,
    pub source: Source,
    /// Set on the single frame the special lock lapsed.
    pub lock_released: Option<Gesture>,
}

#[derive(Debug, Default)]
pub struct StateLock {
    lock: Option<Expiring<Gesture>>,
}

impl StateLock {
    pub fn new() -> Self {
        Self { lock: None }
    }

    /// Pin `gesture` for `hold_secs`, replacing any previous lock.
    pub fn engage(&mut self, gesture: Gesture, now: f64, hold_secs: f64) {
        self.lock = Some(Expiring::new(gesture, now, hold_secs));
    }

    pub fn arbitrate(&mut self, now: f64, resolution: Resolution, stabilized: Gesture) -> Arbitration {
        let mut lock_released = None;

        if let Some(lock) = self.lock {
            if lock.is_expired(now) {
                // Taking the lock out makes the expiry observable once.
                self.lock = None;
                lock_released = Some(lock.value);
                debug!("Special lock {} expired", lock.value);
            } else {
                return Arbitration {
                    gesture: lock.value,
                    source: Source::Lock,
                    lock_released: None,
                };
            }
        }

        let (gesture, source) = if let Some(composite) = resolution.composite {
            (composite, Source::Composite)
        } else if resolution.help {
            (Gesture::Help, Source::Help)
        } else if stabilized != Gesture::None {
            (stabilized, Source::Smoothed)
        } else {
            (Gesture::None, Source::Idle)
        };

        Arbitration {
            gesture,
            source,
            lock_released,
        }
    }

    pub fn clear(&mut self) {
        self.lock = None;
    }
}
