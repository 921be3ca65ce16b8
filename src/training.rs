// src/training.rs
//
// Overlay scoring game: the user is shown a target and scores by producing
// the matching authoritative gesture.

use crate::clock::Cooldown;
use crate::types::{Gesture, TrainingConfig, TrainingTarget};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Disabled,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingHit {
    pub target: TrainingTarget,
    pub score: u32,
    pub next_target: Option<TrainingTarget>,
}

/// Read-only view for snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingStatus {
    pub enabled: bool,
    pub target: Option<String>,
    pub score: u32,
    pub started_at: Option<f64>,
}

pub struct TrainingSession {
    state: TrainingState,
    pool: Vec<TrainingTarget>,
    target: Option<TrainingTarget>,
    score: u32,
    started_at: Option<f64>,
    hit_cooldown: Cooldown,
}

impl TrainingSession {
    pub fn new(config: &TrainingConfig) -> Self {
        Self {
            state: TrainingState::Disabled,
            pool: config.targets.clone(),
            target: None,
            score: 0,
            started_at: None,
            hit_cooldown: Cooldown::strict(config.hit_cooldown_secs),
        }
    }

    pub fn start<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        self.state = TrainingState::Active;
        self.score = 0;
        self.started_at = Some(now);
        self.hit_cooldown.clear();
        self.target = self.draw(rng);
        info!(
            "🎯 Training started, target={}",
            self.target_name().unwrap_or("-")
        );
    }

    /// Freeze score and target.
    pub fn stop(&mut self) {
        if self.state == TrainingState::Active {
            info!("Training stopped with score {}", self.score);
        }
        self.state = TrainingState::Disabled;
    }

    /// Redraw the target without touching the score. No-op when disabled.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.state != TrainingState::Active {
            return false;
        }
        self.target = self.draw(rng);
        true
    }

    /// Score at most one hit for this frame's authoritative gesture.
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        gesture: Gesture,
        now: f64,
        rng: &mut R,
    ) -> Option<TrainingHit> {
        if self.state != TrainingState::Active {
            return None;
        }
        let target = self.target.clone()?;
        if gesture != target.gesture || !self.hit_cooldown.is_ready(now) {
            return None;
        }

        self.score += 1;
        self.hit_cooldown.trigger(now);
        self.target = self.draw(rng);
        info!(
            "✅ Training hit {} (score={}, next={})",
            target.name,
            self.score,
            self.target_name().unwrap_or("-")
        );

        Some(TrainingHit {
            target,
            score: self.score,
            next_target: self.target.clone(),
        })
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TrainingTarget> {
        self.pool.choose(rng).cloned()
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> Option<&TrainingTarget> {
        self.target.as_ref()
    }

    pub fn target_name(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.name.as_str())
    }

    pub fn status(&self) -> TrainingStatus {
        TrainingStatus {
            enabled: self.state == TrainingState::Active,
            target: self.target_name().map(str::to_string),
            score: self.score,
            started_at: self.started_at,
        }
    }
}
