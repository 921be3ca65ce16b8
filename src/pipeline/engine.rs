// src/pipeline/engine.rs
//
// The gesture engine: single owner of every piece of temporal state.
//
// Per frame, strictly in order:
//   smoother -> composite resolver -> sequence detector -> state lock
//   -> event log / training -> snapshot publication
//
// The whole transition runs under one mutex, and readers get an immutable
// `Arc<Snapshot>` published at the end of it, so a reader sees either the
// previous frame or the new one, never a mix.

use super::event_bus::{EngineEvent, EventBus};
use super::event_log::{round2, EventLog, EventLogEntry};
use super::frame_context::FrameContext;
use super::metrics::PipelineMetrics;
use crate::classifier::GestureClassifier;
use crate::clock::Clock;
use crate::detection::{CompositeResolver, GestureHistory, SequenceDetector, Source, StateLock};
use crate::display::{DisplayTable, Mood};
use crate::training::{TrainingSession, TrainingStatus};
use crate::types::{ClassifiedHand, Config, DetectedHand, Gesture};
use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

/// Everything an external reader may see, captured at a frame boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub frame_id: u64,
    pub gesture: Gesture,
    pub confidence: f32,
    pub label: String,
    pub mood: Mood,
    pub history: Vec<Gesture>,
    pub actions: Vec<Gesture>,
    pub events: Vec<EventLogEntry>,
    pub training: TrainingStatus,
}

/// The authoritative result of the latest frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct AuthoritativeResult {
    gesture: Gesture,
    confidence: f32,
}

struct EngineCore {
    config: Config,
    frame_id: u64,
    history: GestureHistory,
    resolver: CompositeResolver,
    detector: SequenceDetector,
    state_lock: StateLock,
    event_log: EventLog,
    training: TrainingSession,
    rng: ChaCha8Rng,
    display: DisplayTable,
    bus: EventBus,
    result: AuthoritativeResult,
    published: Arc<Snapshot>,
}

pub struct GestureEngine {
    core: Mutex<EngineCore>,
    clock: Arc<dyn Clock>,
    classifier: Arc<dyn GestureClassifier>,
    metrics: PipelineMetrics,
}

impl GestureEngine {
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        classifier: Arc<dyn GestureClassifier>,
    ) -> Result<Self> {
        config.validate()?;

        let rng = match config.training.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut core = EngineCore {
            frame_id: 0,
            history: GestureHistory::new(config.engine.history_capacity),
            resolver: CompositeResolver::new(
                config.engine.team_ready_window_secs,
                config.engine.help_height_threshold,
            ),
            detector: SequenceDetector::new(&config.engine),
            state_lock: StateLock::new(),
            event_log: EventLog::new(config.event_log.capacity, config.event_log.cooldown_secs),
            training: TrainingSession::new(&config.training),
            rng,
            display: DisplayTable::new(),
            bus: EventBus::new(config.event_bus.max_pending),
            result: AuthoritativeResult::default(),
            published: Arc::new(Snapshot::empty()),
            config,
        };
        core.publish();

        info!(
            "✓ Gesture engine ready (history={}, unlock={:?})",
            core.config.engine.history_capacity, core.config.engine.unlock_sequence
        );

        Ok(Self {
            core: Mutex::new(core),
            clock,
            classifier,
            metrics: PipelineMetrics::new(),
        })
    }

    /// Classify the detector's hands and run one frame.
    pub fn process_frame(&self, hands: &[DetectedHand]) -> Arc<Snapshot> {
        let classified: Vec<ClassifiedHand> = hands
            .iter()
            .map(|hand| ClassifiedHand {
                reading: self.classifier.classify(&hand.landmarks, hand.side),
                topmost_y: hand.topmost_y(),
            })
            .collect();
        self.ingest(classified)
    }

    /// Run one frame of already-classified hands at the engine clock's time.
    pub fn ingest(&self, hands: Vec<ClassifiedHand>) -> Arc<Snapshot> {
        let started = Instant::now();
        let now = self.clock.now();

        let snapshot = {
            let mut core = self.lock();
            core.frame_id += 1;
            let ctx = FrameContext::new(core.frame_id, now, hands);
            core.step(&ctx, self.clock.as_ref(), &self.metrics);
            core.publish();
            Arc::clone(&core.published)
        };

        self.metrics.record_frame(started.elapsed());
        snapshot
    }

    /// The source had nothing this tick; state is left untouched.
    pub fn skip_tick(&self) {
        self.metrics.inc(&self.metrics.skipped_ticks);
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.lock().published)
    }

    pub fn start_training(&self) -> Arc<Snapshot> {
        let now = self.clock.now();
        self.control(|core| {
            let EngineCore { training, rng, .. } = core;
            training.start(now, rng);
        })
    }

    pub fn stop_training(&self) -> Arc<Snapshot> {
        self.control(|core| core.training.stop())
    }

    pub fn next_target(&self) -> Arc<Snapshot> {
        self.control(|core| {
            let EngineCore { training, rng, .. } = core;
            training.next(rng);
        })
    }

    pub fn drain_events(&self) -> Vec<EngineEvent> {
        self.lock().bus.drain()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    fn control(&self, apply: impl FnOnce(&mut EngineCore)) -> Arc<Snapshot> {
        let mut core = self.lock();
        apply(&mut *core);
        core.publish();
        Arc::clone(&core.published)
    }

    // Every mutation completes inside one critical section, so a poisoned
    // lock still guards a whole frame's state.
    fn lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineCore {
    fn step(&mut self, ctx: &FrameContext, clock: &dyn Clock, metrics: &PipelineMetrics) {
        let now = ctx.timestamp;

        if !ctx.has_hands() {
            self.reset_for_hand_loss(ctx.frame_id);
            metrics.inc(&metrics.frames_without_hands);
            return;
        }

        // Smoother
        let aggregate = ctx.aggregate();
        let stabilized = self.history.push(aggregate.gesture);

        // Composite resolver
        let resolution = self.resolver.resolve(ctx, stabilized);
        if ctx.two_hand_sync() {
            metrics.inc(&metrics.two_hand_frames);
        }

        // Sequence detector, on the primary hand's raw label
        if let Some(unlock) = self.detector.observe(ctx.primary_raw(), now) {
            let engine = &self.config.engine;
            self.state_lock
                .engage(engine.lock_gesture, unlock.timestamp, engine.lock_hold_secs);
            metrics.inc(&metrics.unlocks);
            self.bus.publish(EngineEvent::Unlocked {
                frame_id: ctx.frame_id,
                timestamp: unlock.timestamp,
                gesture: engine.lock_gesture,
            });
        }

        // Arbitration
        let arbitration = self.state_lock.arbitrate(now, resolution, stabilized);
        if let Some(gesture) = arbitration.lock_released {
            self.bus.publish(EngineEvent::LockReleased {
                frame_id: ctx.frame_id,
                gesture,
            });
        }
        if arbitration.source != Source::Smoothed && arbitration.source != Source::Idle {
            debug!(
                "Frame {}: {} from {:?} (stabilized={})",
                ctx.frame_id, arbitration.gesture, arbitration.source, stabilized
            );
        }

        self.result = AuthoritativeResult {
            gesture: arbitration.gesture,
            confidence: aggregate.confidence,
        };

        // Event log
        if let Some(entry) = self.event_log.record(
            self.result.gesture,
            self.result.confidence,
            now,
            || clock.wall_time(),
        ) {
            let entry = entry.clone();
            metrics.inc(&metrics.log_writes);
            self.bus.publish(EngineEvent::GestureLogged(entry));
        }

        // Training
        if let Some(hit) = self.training.observe(self.result.gesture, now, &mut self.rng) {
            metrics.inc(&metrics.training_hits);
            self.bus.publish(EngineEvent::TrainingHit {
                target: hit.target.name,
                score: hit.score,
                next_target: hit.next_target.map(|t| t.name),
            });
        }
    }

    fn reset_for_hand_loss(&mut self, frame_id: u64) {
        let had_state = !self.history.is_empty() || self.result.gesture != Gesture::None;

        self.history.reset();
        self.detector.reset();
        self.state_lock.clear();
        self.result = AuthoritativeResult::default();

        if had_state {
            debug!("Frame {}: hands lost, state reset", frame_id);
            self.bus.publish(EngineEvent::HandsLost { frame_id });
        }
    }

    fn publish(&mut self) {
        let presentation = self.display.lookup(self.result.gesture);
        self.published = Arc::new(Snapshot {
            frame_id: self.frame_id,
            gesture: self.result.gesture,
            confidence: round2(self.result.confidence),
            label: presentation.label,
            mood: presentation.mood,
            history: self.history.labels(),
            actions: self.detector.actions(),
            events: self.event_log.entries(),
            training: self.training.status(),
        });
    }
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            frame_id: 0,
            gesture: Gesture::None,
            confidence: 0.0,
            label: String::new(),
            mood: Mood::Neutral,
            history: Vec::new(),
            actions: Vec::new(),
            events: Vec::new(),
            training: TrainingStatus {
                enabled: false,
                target: None,
                score: 0,
                started_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::classifier::fixtures::synthetic_hand;
    use crate::classifier::FingerStateClassifier;
    use crate::types::{Handedness, HandLandmarks, Landmark, RawReading, LANDMARK_COUNT};
    use std::thread;

    const FRAME: f64 = 0.05;

    struct Harness {
        engine: GestureEngine,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let mut config = Config::default();
        config.training.seed = Some(7);
        let clock = Arc::new(ManualClock::new(0.0));
        let engine =
            GestureEngine::new(config, clock.clone(), Arc::new(FingerStateClassifier)).unwrap();
        Harness { engine, clock }
    }

    fn hand(g: Gesture) -> ClassifiedHand {
        ClassifiedHand::new(g, 0.8, 0.6)
    }

    impl Harness {
        fn frame(&self, t: f64, hands: &[Gesture]) -> Arc<Snapshot> {
            self.clock.set(t);
            self.engine.ingest(hands.iter().map(|g| hand(*g)).collect())
        }

        fn no_hands(&self, t: f64) -> Arc<Snapshot> {
            self.clock.set(t);
            self.engine.ingest(Vec::new())
        }

        /// `frames` single-hand frames of `g`, FRAME apart, starting at `t`.
        fn hold(&self, g: Gesture, frames: u32, mut t: f64) -> (f64, Vec<Arc<Snapshot>>) {
            let mut snaps = Vec::new();
            for _ in 0..frames {
                snaps.push(self.frame(t, &[g]));
                t += FRAME;
            }
            (t, snaps)
        }

        /// PEACE, FIST, OPEN_PALM; returns the snapshot of the frame where
        /// OPEN_PALM reaches four stable frames.
        fn unlock_sequence(&self, t: f64) -> (f64, Arc<Snapshot>) {
            let (t, _) = self.hold(Gesture::Peace, 12, t);
            let (t, _) = self.hold(Gesture::Fist, 12, t);
            let (t, snaps) = self.hold(Gesture::OpenPalm, 4, t);
            (t, snaps[3].clone())
        }
    }

    #[test]
    fn test_history_window_is_last_seven() {
        let h = harness();
        let pushed = [
            Gesture::Fist,
            Gesture::Peace,
            Gesture::OpenPalm,
            Gesture::Fist,
            Gesture::Peace,
            Gesture::ThumbUp,
            Gesture::Fist,
            Gesture::Peace,
            Gesture::Fist,
        ];
        let mut snap = h.engine.snapshot();
        for (i, g) in pushed.iter().enumerate() {
            snap = h.frame(i as f64 * FRAME, &[*g]);
        }
        assert_eq!(
            snap.history,
            vec![
                Gesture::OpenPalm,
                Gesture::Fist,
                Gesture::Peace,
                Gesture::None,
                Gesture::Fist,
                Gesture::Peace,
                Gesture::Fist,
            ]
        );
        assert_eq!(snap.gesture, Gesture::Fist);
    }

    #[test]
    fn test_unlock_sequence_yields_understood() {
        let h = harness();
        let (t, snap) = h.unlock_sequence(0.0);

        assert_eq!(snap.gesture, Gesture::Understood);
        assert_eq!(snap.label, "UNDERSTOOD");
        assert!(snap.actions.is_empty());

        let events = h.engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, EngineEvent::Unlocked { gesture: Gesture::Understood, .. })));

        // Held for 1.2s from the unlock frame, then released exactly once.
        let (_, held) = h.hold(Gesture::OpenPalm, 26, t);
        assert!(held[..23].iter().all(|s| s.gesture == Gesture::Understood));
        assert_eq!(held[24].gesture, Gesture::OpenPalm);
        assert_eq!(held[25].gesture, Gesture::OpenPalm);
        let released = h
            .engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::LockReleased { .. }))
            .count();
        assert_eq!(released, 1);
    }

    #[test]
    fn test_repeat_inside_cooldown_does_not_retrigger() {
        let h = harness();
        let (t, first) = h.unlock_sequence(0.0);
        assert_eq!(first.gesture, Gesture::Understood);

        // Second run matches ~1.8s after the first unlock.
        let (_, second) = h.unlock_sequence(t + 0.4);
        assert_ne!(second.gesture, Gesture::Understood);
        assert_eq!(
            second.actions,
            vec![Gesture::Peace, Gesture::Fist, Gesture::OpenPalm]
        );
    }

    #[test]
    fn test_two_open_palms_is_hands_up_immediately() {
        let h = harness();
        let (t, _) = h.hold(Gesture::Fist, 7, 0.0);
        let snap = h.frame(t, &[Gesture::OpenPalm, Gesture::OpenPalm]);
        assert_eq!(snap.gesture, Gesture::HandsUp);
        assert_eq!(snap.history.last(), Some(&Gesture::HandsUp));
        assert_eq!(snap.label, "HANDS UP");
    }

    #[test]
    fn test_team_ready_window() {
        let h = harness();
        h.frame(1.0, &[Gesture::OpenPalm, Gesture::OpenPalm]);

        let mut snaps = Vec::new();
        for i in 1..=16 {
            snaps.push(h.frame(1.0 + i as f64 * 0.1, &[Gesture::Peace]));
        }
        // t=1.2: [HANDS_UP, PEACE, PEACE]
        assert_eq!(snaps[1].gesture, Gesture::TeamReady);
        // t=2.4: 1.4s after the two-hand frame
        assert_eq!(snaps[13].gesture, Gesture::TeamReady);
        // t=2.6: window closed
        assert_eq!(snaps[15].gesture, Gesture::Peace);
        assert_eq!(snaps[15].label, "CALM");
    }

    #[test]
    fn test_help_needs_raised_hand() {
        let h = harness();
        h.clock.set(0.0);
        let raised = h
            .engine
            .ingest(vec![ClassifiedHand::new(Gesture::OpenPalm, 0.85, 0.1)]);
        assert_eq!(raised.gesture, Gesture::Help);
        assert_eq!(raised.mood, Mood::Alert);

        h.clock.set(0.05);
        let lowered = h
            .engine
            .ingest(vec![ClassifiedHand::new(Gesture::OpenPalm, 0.85, 0.5)]);
        assert_eq!(lowered.gesture, Gesture::OpenPalm);
    }

    #[test]
    fn test_hand_loss_resets_everything() {
        let h = harness();
        let (t, locked) = h.unlock_sequence(0.0);
        assert_eq!(locked.gesture, Gesture::Understood);
        let (t, _) = h.hold(Gesture::Peace, 4, t + 0.5);

        let reset = h.no_hands(t);
        assert_eq!(reset.gesture, Gesture::None);
        assert_eq!(reset.confidence, 0.0);
        assert!(reset.history.is_empty());
        assert!(reset.actions.is_empty());

        // The lock was dropped with everything else.
        let after = h.frame(t + FRAME, &[Gesture::Fist]);
        assert_eq!(after.gesture, Gesture::Fist);
        assert_eq!(after.history, vec![Gesture::Fist]);
        assert!(h
            .engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, EngineEvent::HandsLost { .. })));
    }

    #[test]
    fn test_training_hit_scores_once_and_redraws() {
        let h = harness();
        let started = h.engine.start_training();
        assert!(started.training.enabled);
        assert_eq!(started.training.score, 0);

        let mut found = started.training.target.as_deref() == Some("STOP");
        for _ in 0..200 {
            if found {
                break;
            }
            found = h.engine.next_target().training.target.as_deref() == Some("STOP");
        }
        assert!(found, "seeded draws never produced STOP");

        let hit = h.frame(2.0, &[Gesture::OpenPalm]);
        assert_eq!(hit.training.score, 1);
        let pool: Vec<String> = Config::default()
            .training
            .targets
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert!(pool.contains(hit.training.target.as_ref().unwrap()));

        // Inside the 1.0s hit cooldown nothing more is scored.
        let (_, snaps) = h.hold(Gesture::OpenPalm, 10, 2.0 + FRAME);
        assert!(snaps.iter().all(|s| s.training.score == 1));
    }

    #[test]
    fn test_training_controls() {
        let h = harness();
        let next = h.engine.next_target();
        assert!(!next.training.enabled);
        assert!(next.training.target.is_none());

        h.clock.set(4.0);
        h.engine.start_training();
        let stopped = h.engine.stop_training();
        assert!(!stopped.training.enabled);
        assert_eq!(stopped.training.started_at, Some(4.0));
        assert_eq!(h.engine.snapshot().training, stopped.training);
    }

    #[test]
    fn test_event_log_dedup_and_cooldown() {
        let h = harness();
        h.frame(0.0, &[Gesture::Fist]);
        let snap = h.frame(0.1, &[Gesture::Fist]);
        assert_eq!(snap.events.len(), 1);

        h.frame(1.0, &[Gesture::Peace]);
        h.frame(1.1, &[Gesture::Peace]);
        let snap = h.frame(1.2, &[Gesture::Peace]);
        assert_eq!(snap.gesture, Gesture::Peace);
        assert_eq!(snap.events.len(), 2);
        assert_eq!(snap.events[0].gesture, Gesture::Peace);
        assert_eq!(snap.events[1].gesture, Gesture::Fist);
        assert_eq!(snap.events[0].time, "T+1.20");
    }

    #[test]
    fn test_event_log_bounded() {
        let h = harness();
        let cycle = [Gesture::Fist, Gesture::Peace, Gesture::OpenPalm];
        let mut snap = h.engine.snapshot();
        for i in 0..30 {
            let t = i as f64;
            h.frame(t, &[cycle[i % 3]]);
            snap = h.no_hands(t + 0.5);
        }
        assert_eq!(snap.events.len(), 12);
        assert_eq!(snap.events[0].timestamp, 29.0);
    }

    #[test]
    fn test_process_frame_runs_classifier() {
        let clock = Arc::new(ManualClock::new(0.0));
        let classifier = |_: &HandLandmarks, _: Handedness| RawReading::new(Gesture::Peace, 0.82);
        let engine = GestureEngine::new(Config::default(), clock, Arc::new(classifier)).unwrap();

        let hand = DetectedHand {
            side: Handedness::Left,
            landmarks: [Landmark::new(0.5, 0.7); LANDMARK_COUNT],
        };
        let snap = engine.process_frame(&[hand]);
        assert_eq!(snap.gesture, Gesture::Peace);
        assert_eq!(snap.confidence, 0.82);
        assert_eq!(engine.metrics().summary().total_frames, 1);
    }

    #[test]
    fn test_thumb_out_fist_counts_as_unlock_step() {
        let clock = Arc::new(ManualClock::new(0.0));
        let engine =
            GestureEngine::new(Config::default(), clock.clone(), Arc::new(FingerStateClassifier))
                .unwrap();

        let peace = synthetic_hand(false, [true, true, false, false]);
        let fist = synthetic_hand(true, [false; 4]);
        let palm = synthetic_hand(true, [true; 4]);

        let mut t = 0.0;
        let mut last = engine.snapshot();
        for (landmarks, frames) in [(peace, 12), (fist, 12), (palm, 4)] {
            for _ in 0..frames {
                clock.set(t);
                last = engine.process_frame(&[DetectedHand {
                    side: Handedness::Right,
                    landmarks,
                }]);
                t += FRAME;
            }
        }

        assert_eq!(last.gesture, Gesture::Understood);
        assert!(last.actions.is_empty());
    }

    #[test]
    fn test_skip_tick_leaves_state() {
        let h = harness();
        let before = h.frame(0.0, &[Gesture::Fist]);
        h.engine.skip_tick();
        assert_eq!(h.engine.snapshot(), before);
        assert_eq!(h.engine.metrics().summary().skipped_ticks, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let h = harness();
        let snap = h.frame(0.0, &[Gesture::OpenPalm]);
        let json = serde_json::to_value(&*snap).unwrap();
        assert_eq!(json["gesture"], "OPEN_PALM");
        assert_eq!(json["label"], "STOP");
        assert_eq!(json["mood"], "alert");
        assert_eq!(json["history"][0], "OPEN_PALM");
        assert_eq!(json["events"][0]["gesture"], "OPEN_PALM");
        assert_eq!(json["training"]["enabled"], false);
    }

    #[test]
    fn test_readers_never_see_torn_frames() {
        let h = harness();
        let engine = &h.engine;
        let clock = &h.clock;

        thread::scope(|scope| {
            let writer = scope.spawn(move || {
                for i in 1..=2000u64 {
                    clock.set(i as f64 * 0.01);
                    if i % 2 == 1 {
                        engine.ingest(vec![hand(Gesture::OpenPalm)]);
                    } else {
                        engine.ingest(Vec::new());
                    }
                }
            });

            for reader in 0..3 {
                scope.spawn(move || {
                    let mut last_frame = 0;
                    while last_frame < 2000 {
                        let snap = engine.snapshot();
                        assert!(snap.frame_id >= last_frame);
                        last_frame = snap.frame_id;

                        if snap.frame_id == 0 {
                            continue;
                        }
                        if snap.frame_id % 2 == 1 {
                            assert_eq!(snap.gesture, Gesture::OpenPalm);
                            assert_eq!(snap.history, vec![Gesture::OpenPalm]);
                        } else {
                            assert_eq!(snap.gesture, Gesture::None);
                            assert!(snap.history.is_empty());
                        }
                        assert!(snap.events.len() <= 12);

                        if reader == 0 {
                            engine.next_target();
                        }
                    }
                });
            }

            writer.join().unwrap();
        });

        assert_eq!(h.engine.snapshot().frame_id, 2000);
    }
}
