// src/pipeline/metrics.rs
//
// Counters for the ingestion loop. Clones share the same atomics, so the
// host can read them without touching the engine lock.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_without_hands: Arc<AtomicU64>,
    pub two_hand_frames: Arc<AtomicU64>,
    pub skipped_ticks: Arc<AtomicU64>,
    pub unlocks: Arc<AtomicU64>,
    pub log_writes: Arc<AtomicU64>,
    pub training_hits: Arc<AtomicU64>,
    busy_us: Arc<AtomicU64>,
    peak_frame_us: Arc<AtomicU64>,
    started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        let counter = || Arc::new(AtomicU64::new(0));
        Self {
            total_frames: counter(),
            frames_without_hands: counter(),
            two_hand_frames: counter(),
            skipped_ticks: counter(),
            unlocks: counter(),
            log_writes: counter(),
            training_hits: counter(),
            busy_us: counter(),
            peak_frame_us: counter(),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one processed frame and how long the engine held it.
    pub fn record_frame(&self, took: Duration) {
        let us = took.as_micros().min(u64::MAX as u128) as u64;
        self.total_frames.fetch_add(1, Ordering::Relaxed);
        self.busy_us.fetch_add(us, Ordering::Relaxed);
        self.peak_frame_us.fetch_max(us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let frames = load(&self.total_frames);

        MetricsSummary {
            total_frames: frames,
            fps: self.fps(),
            frames_without_hands: load(&self.frames_without_hands),
            two_hand_frames: load(&self.two_hand_frames),
            skipped_ticks: load(&self.skipped_ticks),
            unlocks: load(&self.unlocks),
            log_writes: load(&self.log_writes),
            training_hits: load(&self.training_hits),
            avg_frame_us: load(&self.busy_us) / frames.max(1),
            peak_frame_us: load(&self.peak_frame_us),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_without_hands: u64,
    pub two_hand_frames: u64,
    pub skipped_ticks: u64,
    pub unlocks: u64,
    pub log_writes: u64,
    pub training_hits: u64,
    pub avg_frame_us: u64,
    pub peak_frame_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing() {
        let metrics = PipelineMetrics::new();
        metrics.record_frame(Duration::from_micros(100));
        metrics.record_frame(Duration::from_micros(300));

        let shared = metrics.clone();
        shared.inc(&shared.unlocks);

        let s = metrics.summary();
        assert_eq!(s.total_frames, 2);
        assert_eq!(s.avg_frame_us, 200);
        assert_eq!(s.peak_frame_us, 300);
        assert_eq!(s.unlocks, 1);
    }

    #[test]
    fn test_empty_summary() {
        let s = PipelineMetrics::default().summary();
        assert_eq!(s.total_frames, 0);
        assert_eq!(s.avg_frame_us, 0);
    }
}
