// src/lib.rs

pub mod classifier;
pub mod clock;
pub mod config;
pub mod detection;
pub mod display;
pub mod frame_source;
pub mod pipeline;
pub mod training;
pub mod types;

pub use pipeline::{GestureEngine, Snapshot};
pub use types::{Config, Gesture};
