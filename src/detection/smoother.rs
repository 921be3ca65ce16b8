// src/detection/smoother.rs
use crate::types::Gesture;
use std::collections::VecDeque;

/// Bounded majority-vote window over per-frame gesture labels.
pub struct GestureHistory {
    history: VecDeque<Gesture>,
    window_size: usize,
}

impl GestureHistory {
    pub fn new(window_size: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Push this frame's aggregate label and return the stabilized one.
    ///
    /// Labels outside the trackable set are stored as NONE.
    pub fn push(&mut self, gesture: Gesture) -> Gesture {
        let gesture = if gesture.is_trackable() {
            gesture
        } else {
            Gesture::None
        };

        self.history.push_back(gesture);
        if self.history.len() > self.window_size {
            self.history.pop_front();
        }

        self.stabilized()
    }

    /// Most frequent label in the window. Ties go to the label whose first
    /// occurrence in the window is oldest.
    pub fn stabilized(&self) -> Gesture {
        // (label, count) in first-appearance order
        let mut counts: Vec<(Gesture, usize)> = Vec::with_capacity(self.window_size);
        for &gesture in &self.history {
            match counts.iter_mut().find(|(g, _)| *g == gesture) {
                Some((_, count)) => *count += 1,
                None => counts.push((gesture, 1)),
            }
        }

        let mut best: Option<(Gesture, usize)> = None;
        for (gesture, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((gesture, count));
            }
        }
        best.map(|(gesture, _)| gesture).unwrap_or(Gesture::None)
    }

    /// Drop everything (hand lost).
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn labels(&self) -> Vec<Gesture> {
        self.history.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
