//! Two-worker acquisition pipeline: FrameSource → queue → SinkStation.

use crate::defaults;
use crate::error::{Result, StreamError};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::queue::stream_queue;
use crate::pipeline::sink::SinkStation;
use crate::pipeline::types::{ConsumptionSummary, ProductionSummary, ReducedView, RunReport};
use crate::pipeline::worker::Worker;
use crate::source::FrameSource;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Transfer queue capacity (`None` = unbounded). A full queue blocks the producer.
    pub queue_capacity: Option<usize>,
    /// How often `wait` checks whether both workers are still alive.
    pub liveness_interval: Duration,
    /// Optional receiver of reduced-view batches (non-blocking, lossy).
    pub view_tx: Option<Sender<Vec<ReducedView>>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: None,
            liveness_interval: defaults::liveness_interval(),
            view_tx: None,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    producer: Worker<ProductionSummary>,
    consumer: Worker<ConsumptionSummary>,
    liveness_interval: Duration,
    started: Instant,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl PipelineHandle {
    fn new(
        producer: Worker<ProductionSummary>,
        consumer: Worker<ConsumptionSummary>,
        liveness_interval: Duration,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            producer,
            consumer,
            liveness_interval,
            started: Instant::now(),
            error_reporter,
        }
    }

    /// Returns true while either worker is still running.
    pub fn is_running(&self) -> bool {
        !self.producer.is_finished() || !self.consumer.is_finished()
    }

    /// Blocks until both workers have terminated.
    ///
    /// A panicking worker is reported as `ProducerCrash` / `ConsumerCrash`.
    /// When both workers fail, the root cause is returned: a consumer that
    /// only saw its producer vanish yields to the producer's own error.
    pub fn wait(self) -> Result<RunReport> {
        while self.is_running() {
            thread::sleep(self.liveness_interval);
        }

        let producer_name = self.producer.name();
        let consumer_name = self.consumer.name();

        let production = self
            .producer
            .join()
            .unwrap_or_else(|panic| {
                Err(StreamError::ProducerCrash {
                    message: format!("{} worker panicked: {}", producer_name, panic),
                })
            });
        let consumption = self
            .consumer
            .join()
            .unwrap_or_else(|panic| {
                Err(StreamError::ConsumerCrash {
                    message: format!("{} worker panicked: {}", consumer_name, panic),
                })
            });

        if let Err(e) = &production {
            self.error_reporter.report(producer_name, e);
        }
        if let Err(e) = &consumption {
            self.error_reporter.report(consumer_name, e);
        }

        let (production, consumption) = match (production, consumption) {
            (Ok(p), Ok(c)) => (p, c),
            (Err(p), Ok(_)) => return Err(p),
            (Ok(_), Err(c)) => return Err(c),
            (Err(p), Err(c)) => return Err(if c.is_producer_crash() { p } else { c }),
        };

        Ok(RunReport {
            production,
            consumption,
            elapsed: self.started.elapsed(),
        })
    }
}

/// Acquisition pipeline: one producer worker, one consumer worker, one queue.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the pipeline.
    ///
    /// # Arguments
    /// * `source` - Frame source; opened here, before any worker starts
    /// * `destination` - Optional persisted stream path
    ///
    /// # Returns
    /// Handle to wait on the run
    pub fn start(
        self,
        mut source: Box<dyn FrameSource>,
        destination: Option<PathBuf>,
    ) -> Result<PipelineHandle> {
        source.open()?;

        let (producer, mut consumer) = stream_queue(self.config.queue_capacity);

        let mut sink = SinkStation::new(destination);
        if let Some(view_tx) = self.config.view_tx {
            sink = sink.with_view_sender(view_tx);
        }

        let consumer_worker = Worker::spawn("sink", move || sink.run(&mut consumer))?;

        let source_name = source.name();
        let producer_worker = Worker::spawn(source_name, move || {
            let summary = source.produce(&producer)?;
            producer.release()?;
            Ok(summary)
        })?;

        Ok(PipelineHandle::new(
            producer_worker,
            consumer_worker,
            self.config.liveness_interval,
            self.error_reporter,
        ))
    }

    /// Starts the pipeline and blocks until both workers finish.
    pub fn run(
        self,
        source: Box<dyn FrameSource>,
        destination: Option<PathBuf>,
    ) -> Result<RunReport> {
        self.start(source, destination)?.wait()
    }
}
