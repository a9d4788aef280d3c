//! Consumer side of the pipeline: transcode, persist, surface the live view.

use crate::error::Result;
use crate::pipeline::queue::FrameConsumer;
use crate::pipeline::transcoder::{extract, reduce};
use crate::pipeline::types::{ConsumptionSummary, RawFrame, ReducedView};
use crate::storage::PersistedStream;
use crossbeam_channel::{Sender, TrySendError};
use std::path::PathBuf;

/// Drains the transfer queue until the end-of-stream marker.
///
/// Each frame is transcoded, appended to the destination when one is
/// configured, and offered to the live view without blocking. Transcode and
/// write failures end the loop; nothing is retried.
pub struct SinkStation {
    destination: Option<PersistedStream>,
    view_tx: Option<Sender<Vec<ReducedView>>>,
    summary: ConsumptionSummary,
}

impl SinkStation {
    pub fn new(destination: Option<PathBuf>) -> Self {
        Self {
            destination: destination.map(PersistedStream::new),
            view_tx: None,
            summary: ConsumptionSummary::default(),
        }
    }

    /// Forwards each reduced batch to `tx`. A full channel drops the batch.
    pub fn with_view_sender(mut self, tx: Sender<Vec<ReducedView>>) -> Self {
        self.view_tx = Some(tx);
        self
    }

    pub fn summary(&self) -> ConsumptionSummary {
        self.summary
    }

    /// Handles one frame.
    pub fn process(&mut self, frame: RawFrame) -> Result<()> {
        let records = extract(&frame)?;

        if let Some(destination) = self.destination.as_mut() {
            destination.append(&records)?;
        }

        self.summary.frames += 1;
        self.summary.records += records.len() as u64;

        if records.is_empty() {
            return Ok(());
        }

        if let Some(tx) = self.view_tx.as_ref() {
            match tx.try_send(reduce(&records)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.summary.views_dropped += 1;
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::debug!("sink: live view receiver gone, no longer forwarding");
                    self.summary.views_dropped += 1;
                    self.view_tx = None;
                }
            }
        } else if log::log_enabled!(log::Level::Trace)
            && let Some(last) = records.last()
        {
            log::trace!("sink: {} records, last {}", records.len(), last.reduced());
        }

        Ok(())
    }

    /// Runs until the producer releases the stream.
    pub fn run(mut self, consumer: &mut FrameConsumer) -> Result<ConsumptionSummary> {
        while let Some(frame) = consumer.recv()? {
            self.process(frame)?;
        }
        log::info!(
            "sink: process done, {} frames / {} records",
            self.summary.frames,
            self.summary.records
        );
        Ok(self.summary)
    }
}
