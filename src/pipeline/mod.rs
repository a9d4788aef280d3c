//! Frame acquisition pipeline.
//!
//! A producer worker pushes raw frames into a transfer queue and a consumer
//! worker transcodes, persists and forwards them. Completion travels in-band
//! as an end-of-stream marker, so the consumer never has to guess whether an
//! empty queue means "done".

pub mod error;
pub mod orchestrator;
pub mod queue;
pub mod schema;
pub mod sink;
pub mod transcoder;
pub mod types;
pub mod worker;

pub use error::{ErrorReporter, LogReporter};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle};
pub use queue::{
    CompletionSignal, FrameConsumer, FrameProducer, QueueItem, StreamConsumer, StreamProducer,
    stream_queue,
};
pub use sink::SinkStation;
pub use transcoder::{extract, reduce};
pub use types::{
    ConsumptionSummary, LabeledRecord, ProductionSummary, RawFrame, ReducedView, RunReport,
};
pub use worker::Worker;
