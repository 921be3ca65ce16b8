use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of landmarks the pose detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

// ============================================================================
// GESTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gesture {
    #[default]
    None,
    OpenPalm,
    Fist,
    Peace,
    ThumbUp,
    ThumbDown,
    HandsUp,
    TeamReady,
    Help,
    Understood,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::OpenPalm => "OPEN_PALM",
            Self::Fist => "FIST",
            Self::Peace => "PEACE",
            Self::ThumbUp => "THUMB_UP",
            Self::ThumbDown => "THUMB_DOWN",
            Self::HandsUp => "HANDS_UP",
            Self::TeamReady => "TEAM_READY",
            Self::Help => "HELP",
            Self::Understood => "UNDERSTOOD",
        }
    }

    /// Labels the smoothing window keeps; everything else is stored as NONE.
    pub fn is_trackable(&self) -> bool {
        matches!(
            self,
            Self::OpenPalm | Self::Fist | Self::Peace | Self::HandsUp | Self::None
        )
    }

    /// Labels the unlock detector accepts as sequence steps.
    pub fn is_sequence_action(&self) -> bool {
        matches!(self, Self::Peace | Self::Fist | Self::OpenPalm)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// HANDS
// ============================================================================

/// Normalized landmark: x/y in [0, 1] with 0 at the top-left of the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub type HandLandmarks = [Landmark; LANDMARK_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// One hand as reported by the external pose detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedHand {
    #[serde(default)]
    pub side: Handedness,
    pub landmarks: HandLandmarks,
}

impl DetectedHand {
    /// Smallest normalized y across all landmarks (0 = top of frame).
    pub fn topmost_y(&self) -> f32 {
        self.landmarks
            .iter()
            .map(|lm| lm.y)
            .fold(f32::INFINITY, f32::min)
    }
}

/// Unsmoothed classifier output for a single hand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RawReading {
    pub gesture: Gesture,
    pub confidence: f32,
}

impl RawReading {
    pub fn new(gesture: Gesture, confidence: f32) -> Self {
        Self {
            gesture,
            confidence,
        }
    }
}

/// A hand after classification: everything the core needs from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedHand {
    pub reading: RawReading,
    pub topmost_y: f32,
}

impl ClassifiedHand {
    pub fn new(gesture: Gesture, confidence: f32, topmost_y: f32) -> Self {
        Self {
            reading: RawReading::new(gesture, confidence),
            topmost_y,
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub event_log: EventLogConfig,
    pub event_bus: EventBusConfig,
    pub training: TrainingConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history_capacity: usize,
    pub action_capacity: usize,
    pub stable_frames: u32,
    pub action_gap_secs: f64,
    pub unlock_sequence: Vec<Gesture>,
    pub unlock_cooldown_secs: f64,
    pub lock_gesture: Gesture,
    pub lock_hold_secs: f64,
    pub team_ready_window_secs: f64,
    pub help_height_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 7,
            action_capacity: 6,
            stable_frames: 4,
            action_gap_secs: 0.45,
            unlock_sequence: vec![Gesture::Peace, Gesture::Fist, Gesture::OpenPalm],
            unlock_cooldown_secs: 2.0,
            lock_gesture: Gesture::Understood,
            lock_hold_secs: 1.2,
            team_ready_window_secs: 1.5,
            help_height_threshold: 0.30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    pub capacity: usize,
    pub cooldown_secs: f64,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            capacity: 12,
            cooldown_secs: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventBusConfig {
    pub max_pending: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { max_pending: 64 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTarget {
    pub name: String,
    pub gesture: Gesture,
}

impl TrainingTarget {
    pub fn new(name: &str, gesture: Gesture) -> Self {
        Self {
            name: name.to_string(),
            gesture,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub hit_cooldown_secs: f64,
    /// Fixed seed for target draws; entropy when absent.
    pub seed: Option<u64>,
    pub auto_start: bool,
    pub targets: Vec<TrainingTarget>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hit_cooldown_secs: 1.0,
            seed: None,
            auto_start: false,
            targets: vec![
                TrainingTarget::new("STOP", Gesture::OpenPalm),
                TrainingTarget::new("HOLD", Gesture::Fist),
                TrainingTarget::new("CALM", Gesture::Peace),
                TrainingTarget::new("HANDS UP", Gesture::HandsUp),
                TrainingTarget::new("TEAM READY", Gesture::TeamReady),
                TrainingTarget::new("HELP", Gesture::Help),
                TrainingTarget::new("UNDERSTOOD", Gesture::Understood),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: String,
    pub target_fps: u32,
    pub loop_playback: bool,
    pub poll_interval_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: "recordings/demo.jsonl".to_string(),
            target_fps: 30,
            loop_playback: false,
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
