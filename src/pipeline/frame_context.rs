// src/pipeline/frame_context.rs
//
// Everything one ingested frame contributes. Every stage of the engine
// reads from the same context so they all agree on which hands were seen.

use crate::types::{ClassifiedHand, Gesture, RawReading};

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub frame_id: u64,
    pub timestamp: f64,
    /// Detector order; the first hand is the primary one.
    pub hands: Vec<ClassifiedHand>,
}

impl FrameContext {
    pub fn new(frame_id: u64, timestamp: f64, hands: Vec<ClassifiedHand>) -> Self {
        Self {
            frame_id,
            timestamp,
            hands,
        }
    }

    pub fn has_hands(&self) -> bool {
        !self.hands.is_empty()
    }

    pub fn primary(&self) -> Option<&ClassifiedHand> {
        self.hands.first()
    }

    /// Primary hand's raw label, NONE when no hand was seen.
    pub fn primary_raw(&self) -> Gesture {
        self.primary()
            .map(|h| h.reading.gesture)
            .unwrap_or(Gesture::None)
    }

    /// Both of the first two hands show an open palm on this frame.
    pub fn two_hand_sync(&self) -> bool {
        match self.hands.as_slice() {
            [a, b, ..] => {
                a.reading.gesture == Gesture::OpenPalm && b.reading.gesture == Gesture::OpenPalm
            }
            _ => false,
        }
    }

    /// The single reading fed to the smoothing window: HANDS_UP (mean of
    /// both confidences) on two-hand synchrony, else the primary hand.
    pub fn aggregate(&self) -> RawReading {
        if self.two_hand_sync() {
            let conf = (self.hands[0].reading.confidence + self.hands[1].reading.confidence) / 2.0;
            return RawReading::new(Gesture::HandsUp, conf);
        }
        self.primary()
            .map(|h| h.reading)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_two_open_palms() {
        let ctx = FrameContext::new(
            1,
            0.0,
            vec![
                ClassifiedHand::new(Gesture::OpenPalm, 0.8, 0.5),
                ClassifiedHand::new(Gesture::OpenPalm, 0.6, 0.5),
                ClassifiedHand::new(Gesture::Fist, 0.9, 0.5),
            ],
        );
        let agg = ctx.aggregate();
        assert_eq!(agg.gesture, Gesture::HandsUp);
        assert!((agg.confidence - 0.7).abs() < 1e-6);
        assert_eq!(ctx.primary_raw(), Gesture::OpenPalm);
    }

    #[test]
    fn test_aggregate_mixed_hands_uses_primary() {
        let ctx = FrameContext::new(
            1,
            0.0,
            vec![
                ClassifiedHand::new(Gesture::Peace, 0.82, 0.5),
                ClassifiedHand::new(Gesture::OpenPalm, 0.85, 0.5),
            ],
        );
        assert!(!ctx.two_hand_sync());
        assert_eq!(ctx.aggregate().gesture, Gesture::Peace);
    }

    #[test]
    fn test_empty_frame() {
        let ctx = FrameContext::new(1, 0.0, Vec::new());
        assert!(!ctx.has_hands());
        assert_eq!(ctx.aggregate(), RawReading::default());
        assert_eq!(ctx.primary_raw(), Gesture::None);
    }
}
