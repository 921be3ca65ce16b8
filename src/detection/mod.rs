// src/detection/mod.rs

mod composite;
mod sequence;
mod smoother;
mod state_lock;

// Re-export public APIs
pub use composite::{CompositeResolver, Resolution};
pub use sequence::{SequenceDetector, StabilityCounter, Unlock};
pub use smoother::GestureHistory;
pub use state_lock::{Arbitration, Source, StateLock};
