// src/display.rs
//
// Visual vocabulary for the polling UI: authoritative gesture -> label + mood.

use crate::types::Gesture;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Neutral,
    Alert,
    Focus,
    Calm,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub label: String,
    pub mood: Mood,
}

pub struct DisplayTable {
    entries: HashMap<Gesture, (&'static str, Mood)>,
}

impl DisplayTable {
    pub fn new() -> Self {
        let entries = HashMap::from([
            (Gesture::None, ("…", Mood::Neutral)),
            (Gesture::OpenPalm, ("STOP", Mood::Alert)),
            (Gesture::Fist, ("HOLD", Mood::Focus)),
            (Gesture::Peace, ("CALM", Mood::Calm)),
            (Gesture::ThumbUp, ("YES", Mood::Good)),
            (Gesture::ThumbDown, ("NO", Mood::Bad)),
            (Gesture::HandsUp, ("HANDS UP", Mood::Alert)),
            (Gesture::TeamReady, ("TEAM READY", Mood::Good)),
            (Gesture::Help, ("HELP", Mood::Alert)),
            (Gesture::Understood, ("UNDERSTOOD", Mood::Good)),
        ]);
        Self { entries }
    }

    /// Unmapped gestures render as their own name with a neutral mood.
    pub fn lookup(&self, gesture: Gesture) -> Presentation {
        let (label, mood) = self
            .entries
            .get(&gesture)
            .copied()
            .unwrap_or((gesture.as_str(), Mood::Neutral));
        Presentation {
            label: label.to_string(),
            mood,
        }
    }

}

impl Default for DisplayTable {
    fn default() -> Self {
        Self::new()
    }
}
