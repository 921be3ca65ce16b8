// src/clock.rs
//
// Time source and the two timing records every debounce, cooldown and
// hold window in the engine is expressed with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Seconds since an arbitrary origin. Assumed monotonic.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;

    /// Human-readable stamp for event log entries.
    fn wall_time(&self) -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }

    fn wall_time(&self) -> String {
        format!("T+{:.2}", self.now())
    }
}

/// A value that holds until `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expiring<T> {
    pub value: T,
    pub expires_at: f64,
}

impl<T: Copy> Expiring<T> {
    pub fn new(value: T, now: f64, hold_secs: f64) -> Self {
        Self {
            value,
            expires_at: now + hold_secs,
        }
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.expires_at
    }
}

/// Last trigger time plus the period that must pass before the next one.
///
/// A clock that runs backwards yields a negative elapsed time, which is
/// clamped to zero: cooldowns stay closed and windows stay open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    period: f64,
    inclusive: bool,
    last: Option<f64>,
}

impl Cooldown {
    /// Ready once strictly more than `period` has elapsed.
    pub fn strict(period: f64) -> Self {
        Self {
            period,
            inclusive: false,
            last: None,
        }
    }

    /// Ready once at least `period` has elapsed.
    pub fn inclusive(period: f64) -> Self {
        Self {
            period,
            inclusive: true,
            last: None,
        }
    }

    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.last.map(|t| (now - t).max(0.0))
    }

    pub fn is_ready(&self, now: f64) -> bool {
        match self.elapsed(now) {
            None => true,
            Some(dt) if self.inclusive => dt >= self.period,
            Some(dt) => dt > self.period,
        }
    }

    /// True while the last trigger is less than `period` old.
    pub fn is_within(&self, now: f64) -> bool {
        self.elapsed(now).is_some_and(|dt| dt < self.period)
    }

    pub fn trigger(&mut self, now: f64) {
        self.last = Some(now);
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
