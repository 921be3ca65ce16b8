// src/main.rs

use anyhow::Result;
use gesture_engine::classifier::FingerStateClassifier;
use gesture_engine::clock::SystemClock;
use gesture_engine::frame_source::{FramePoll, FrameSource, ReplaySource};
use gesture_engine::pipeline::EngineEvent;
use gesture_engine::{Config, GestureEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("GESTURE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let loaded = Config::load_if_present(&config_path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // The filter needs the configured level; report the load outcome after init.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gesture_engine={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("✋ Gesture Engine Starting");
    if found {
        info!("✓ Configuration loaded from {}", config_path);
    } else {
        warn!("Config {} not found, using defaults", config_path);
    }
    info!(
        "Engine: history={}, actions={}, stable_frames={}, unlock={:?}",
        config.engine.history_capacity,
        config.engine.action_capacity,
        config.engine.stable_frames,
        config.engine.unlock_sequence
    );

    let source_config = config.source.clone();
    let auto_start = config.training.auto_start;

    let engine = Arc::new(GestureEngine::new(
        config,
        Arc::new(SystemClock::new()),
        Arc::new(FingerStateClassifier),
    )?);

    if auto_start {
        engine.start_training();
    }

    let mut source = ReplaySource::open(&source_config.path, source_config.loop_playback)?;

    let poller = {
        let engine = Arc::clone(&engine);
        let period = Duration::from_millis(source_config.poll_interval_ms.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match serde_json::to_string(engine.snapshot().as_ref()) {
                    Ok(json) => debug!("snapshot {}", json),
                    Err(e) => warn!("Failed to serialize snapshot: {}", e),
                }
            }
        })
    };

    let frame_period = Duration::from_secs_f64(1.0 / source_config.target_fps as f64);
    let mut ticker = tokio::time::interval(frame_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        match source.poll() {
            Ok(FramePoll::Ready(hands)) => {
                engine.process_frame(&hands);
            }
            Ok(FramePoll::Pending) => engine.skip_tick(),
            Ok(FramePoll::Exhausted) => {
                info!("Recording exhausted");
                break;
            }
            Err(e) => {
                warn!("Frame acquisition failed: {:#}", e);
                engine.skip_tick();
            }
        }

        for event in engine.drain_events() {
            report(&event);
        }
    }

    poller.abort();

    let last = engine.snapshot();
    let stats = engine.metrics().summary();

    info!("\n📊 Final Report:");
    info!("  Frames processed: {}", stats.total_frames);
    info!(
        "  Frames without hands: {} ({:.1}%)",
        stats.frames_without_hands,
        100.0 * stats.frames_without_hands as f64 / stats.total_frames.max(1) as f64
    );
    info!("  ⏭️  Skipped ticks: {}", stats.skipped_ticks);
    info!("  🙌 Two-hand frames: {}", stats.two_hand_frames);
    info!("  🔓 Unlocks: {}", stats.unlocks);
    info!("  📝 Log entries written: {}", stats.log_writes);
    if last.training.enabled || stats.training_hits > 0 {
        info!(
            "  🎯 Training hits: {} (score {})",
            stats.training_hits, last.training.score
        );
    }
    info!("  Last gesture: {} ({})", last.label, last.gesture);
    info!(
        "  ⏱️  Frame time: avg {}µs, peak {}µs",
        stats.avg_frame_us, stats.peak_frame_us
    );
    info!("  Processing Speed: {:.1} FPS", stats.fps);

    match serde_json::to_string_pretty(&stats) {
        Ok(json) => debug!("metrics {}", json),
        Err(e) => error!("Failed to serialize metrics: {}", e),
    }

    Ok(())
}

fn report(event: &EngineEvent) {
    match event {
        EngineEvent::Unlocked {
            frame_id,
            timestamp,
            gesture,
        } => info!(
            "🔓 UNLOCK at frame {} ({:.2}s), holding {}",
            frame_id, timestamp, gesture
        ),
        EngineEvent::LockReleased { frame_id, gesture } => {
            debug!("Lock on {} released at frame {}", gesture, frame_id)
        }
        EngineEvent::GestureLogged(entry) => info!(
            "📝 {} {} ({:.2})",
            entry.time, entry.gesture, entry.confidence
        ),
        EngineEvent::TrainingHit {
            target,
            score,
            next_target,
        } => info!(
            "🎯 Training hit {} (score={}, next={})",
            target,
            score,
            next_target.as_deref().unwrap_or("-")
        ),
        EngineEvent::HandsLost { frame_id } => debug!("Hands lost at frame {}", frame_id),
    }
}
