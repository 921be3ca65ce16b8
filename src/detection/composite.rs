// src/detection/composite.rs
//
// Gestures that a single hand on a single frame cannot express:
// two-hand synchrony (HANDS_UP), PEACE shortly after a two-hand frame
// (TEAM_READY) and an open palm raised near the top of the frame (HELP).

use crate::clock::Cooldown;
use crate::pipeline::FrameContext;
use crate::types::Gesture;
use tracing::debug;

/// What the resolver contributes to arbitration for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    /// HANDS_UP or TEAM_READY.
    pub composite: Option<Gesture>,
    /// Set only when no composite override applied.
    pub help: bool,
}

pub struct CompositeResolver {
    two_hand_window: Cooldown,
    help_height_threshold: f32,
}

impl CompositeResolver {
    pub fn new(team_ready_window_secs: f64, help_height_threshold: f32) -> Self {
        Self {
            two_hand_window: Cooldown::strict(team_ready_window_secs),
            help_height_threshold,
        }
    }

    /// Decide overrides for this frame. HANDS_UP and TEAM_READY are settled
    /// before HELP is considered.
    pub fn resolve(&mut self, ctx: &FrameContext, stabilized: Gesture) -> Resolution {
        if ctx.two_hand_sync() {
            self.two_hand_window.trigger(ctx.timestamp);
            return Resolution {
                composite: Some(Gesture::HandsUp),
                help: false,
            };
        }

        if stabilized == Gesture::Peace && self.two_hand_window.is_within(ctx.timestamp) {
            debug!(
                "TEAM_READY: PEACE {:.2}s after two-hand frame",
                self.two_hand_window.elapsed(ctx.timestamp).unwrap_or_default()
            );
            return Resolution {
                composite: Some(Gesture::TeamReady),
                help: false,
            };
        }

        let help = stabilized == Gesture::OpenPalm
            && ctx
                .primary()
                .is_some_and(|hand| hand.topmost_y < self.help_height_threshold);

        Resolution {
            composite: None,
            help,
        }
    }
}
