use crate::types::Config;
use anyhow::{bail, ensure, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists. `None` means the caller should fall back
    /// to defaults; it is left to the caller to report that.
    pub fn load_if_present(path: &str) -> Result<Option<Self>> {
        if Path::new(path).exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;

        ensure!(engine.history_capacity > 0, "engine.history_capacity must be > 0");
        ensure!(engine.action_capacity > 0, "engine.action_capacity must be > 0");
        ensure!(engine.stable_frames > 0, "engine.stable_frames must be > 0");
        ensure!(
            !engine.unlock_sequence.is_empty(),
            "engine.unlock_sequence must not be empty"
        );
        ensure!(
            engine.unlock_sequence.len() <= engine.action_capacity,
            "engine.unlock_sequence ({} steps) exceeds action_capacity ({})",
            engine.unlock_sequence.len(),
            engine.action_capacity
        );
        if let Some(bad) = engine
            .unlock_sequence
            .iter()
            .find(|g| !g.is_sequence_action())
        {
            bail!("engine.unlock_sequence contains non-action gesture {}", bad);
        }

        let durations = [
            ("engine.action_gap_secs", engine.action_gap_secs),
            ("engine.unlock_cooldown_secs", engine.unlock_cooldown_secs),
            ("engine.lock_hold_secs", engine.lock_hold_secs),
            ("engine.team_ready_window_secs", engine.team_ready_window_secs),
            ("event_log.cooldown_secs", self.event_log.cooldown_secs),
            ("training.hit_cooldown_secs", self.training.hit_cooldown_secs),
        ];
        for (name, value) in durations {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be a non-negative number (got {})",
                name,
                value
            );
        }

        ensure!(self.event_log.capacity > 0, "event_log.capacity must be > 0");
        ensure!(self.event_bus.max_pending > 0, "event_bus.max_pending must be > 0");
        ensure!(
            !self.training.targets.is_empty(),
            "training.targets must not be empty"
        );
        ensure!(self.source.target_fps > 0, "source.target_fps must be > 0");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Config, Gesture};

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.history_capacity, 7);
        assert_eq!(config.event_log.capacity, 12);
        assert_eq!(config.training.targets.len(), 7);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "engine:\n  stable_frames: 6\n  unlock_sequence: [FIST, PEACE]\nevent_log:\n  capacity: 5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.engine.stable_frames, 6);
        assert_eq!(
            config.engine.unlock_sequence,
            vec![Gesture::Fist, Gesture::Peace]
        );
        assert_eq!(config.engine.history_capacity, 7);
        assert_eq!(config.event_log.capacity, 5);
        assert!((config.event_log.cooldown_secs - 0.7).abs() < 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_action_sequence_step() {
        let mut config = Config::default();
        config.engine.unlock_sequence = vec![Gesture::Peace, Gesture::ThumbUp];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_sequence_longer_than_buffer() {
        let mut config = Config::default();
        config.engine.action_capacity = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_if_present() {
        let missing = std::env::temp_dir().join("gesture-engine-no-such-config.yaml");
        let missing = missing.to_string_lossy();
        assert!(Config::load_if_present(&missing).unwrap().is_none());

        let path = std::env::temp_dir().join(format!(
            "gesture-engine-config-{}.yaml",
            std::process::id()
        ));
        std::fs::write(&path, "event_log:\n  capacity: 3\n").unwrap();
        let found = Config::load_if_present(&path.to_string_lossy())
            .unwrap()
            .unwrap();
        assert_eq!(found.event_log.capacity, 3);

        std::fs::write(&path, "event_log:\n  capacity: 0\n").unwrap();
        assert!(Config::load_if_present(&path.to_string_lossy()).is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_rejects_empty_target_pool() {
        let mut config = Config::default();
        config.training.targets.clear();
        assert!(config.validate().is_err());
    }
}
