// src/classifier.rs
//
// Single-frame hand classification. The engine only depends on the
// `GestureClassifier` seam; `FingerStateClassifier` is the stock
// threshold-based implementation used by the host binary.

use crate::types::{Gesture, HandLandmarks, Handedness, RawReading};

pub trait GestureClassifier: Send + Sync {
    /// Pure function of one hand's landmarks.
    fn classify(&self, landmarks: &HandLandmarks, side: Handedness) -> RawReading;
}

impl<F> GestureClassifier for F
where
    F: Fn(&HandLandmarks, Handedness) -> RawReading + Send + Sync,
{
    fn classify(&self, landmarks: &HandLandmarks, side: Handedness) -> RawReading {
        self(landmarks, side)
    }
}

// Landmark indices
const WRIST: usize = 0;
const THUMB_IP: usize = 3;
const THUMB_TIP: usize = 4;
const INDEX_MCP: usize = 5;
const INDEX_PIP: usize = 6;
const INDEX_TIP: usize = 8;
const MIDDLE_PIP: usize = 10;
const MIDDLE_TIP: usize = 12;
const RING_PIP: usize = 14;
const RING_TIP: usize = 16;
const PINKY_PIP: usize = 18;
const PINKY_TIP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Finger extension for an upright-ish hand.
    pub fn from_landmarks(lms: &HandLandmarks) -> Self {
        let up = |tip: usize, pip: usize| lms[tip].y < lms[pip].y;
        let index_mcp = &lms[INDEX_MCP];

        Self {
            // Thumb tip further from the palm than its IP joint
            thumb: lms[THUMB_TIP].planar_distance(index_mcp)
                > lms[THUMB_IP].planar_distance(index_mcp),
            index: up(INDEX_TIP, INDEX_PIP),
            middle: up(MIDDLE_TIP, MIDDLE_PIP),
            ring: up(RING_TIP, RING_PIP),
            pinky: up(PINKY_TIP, PINKY_PIP),
        }
    }

    pub fn count(&self) -> usize {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .filter(|up| **up)
            .count()
    }

    fn four_fingers_down(&self) -> bool {
        !self.index && !self.middle && !self.ring && !self.pinky
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FingerStateClassifier;

impl GestureClassifier for FingerStateClassifier {
    fn classify(&self, landmarks: &HandLandmarks, _side: Handedness) -> RawReading {
        let up = FingerStates::from_landmarks(landmarks);

        if up.index && up.middle && up.ring && up.pinky {
            return RawReading::new(Gesture::OpenPalm, 0.85);
        }

        // A thumb sticking out of a fist still reads as FIST
        if up.count() <= 1 && up.four_fingers_down() {
            return RawReading::new(Gesture::Fist, 0.80);
        }

        if up.index && up.middle && !up.ring && !up.pinky {
            return RawReading::new(Gesture::Peace, 0.82);
        }

        if up.thumb && up.four_fingers_down() {
            return if landmarks[THUMB_TIP].y < landmarks[WRIST].y {
                RawReading::new(Gesture::ThumbUp, 0.80)
            } else {
                RawReading::new(Gesture::ThumbDown, 0.78)
            };
        }

        RawReading::new(Gesture::None, 0.40)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::types::{Landmark, LANDMARK_COUNT};

    /// Upright hand at the bottom of the frame. Each finger flag picks
    /// whether its tip sits above (extended) or below (curled) its PIP.
    pub(crate) fn synthetic_hand(thumb: bool, fingers: [bool; 4]) -> HandLandmarks {
        let mut lms = [Landmark::new(0.5, 0.8); LANDMARK_COUNT];
        lms[WRIST] = Landmark::new(0.5, 0.9);
        lms[INDEX_MCP] = Landmark::new(0.45, 0.7);

        lms[THUMB_IP] = Landmark::new(0.40, 0.72);
        lms[THUMB_TIP] = if thumb {
            Landmark::new(0.30, 0.60)
        } else {
            Landmark::new(0.44, 0.71)
        };

        let pairs = [
            (INDEX_PIP, INDEX_TIP),
            (MIDDLE_PIP, MIDDLE_TIP),
            (RING_PIP, RING_TIP),
            (PINKY_PIP, PINKY_TIP),
        ];
        for ((pip, tip), extended) in pairs.into_iter().zip(fingers) {
            lms[pip] = Landmark::new(0.5, 0.6);
            lms[tip] = Landmark::new(0.5, if extended { 0.45 } else { 0.65 });
        }
        lms
    }
}
