// src/pipeline/mod.rs

pub mod engine;
pub mod event_bus;
pub mod event_log;
pub mod frame_context;
pub mod metrics;

pub use engine::{GestureEngine, Snapshot};
pub use event_bus::{EngineEvent, EventBus};
pub use event_log::{EventLog, EventLogEntry};
pub use frame_context::FrameContext;
pub use metrics::{MetricsSummary, PipelineMetrics};
