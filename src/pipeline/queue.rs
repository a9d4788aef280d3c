//! Ordered transfer queue between the producing and consuming workers.
//!
//! Completion travels in-band: the producer's last act is pushing an
//! end-of-stream marker behind its final item, so the consumer can never see
//! "stream closed" before it has seen every item. An empty queue means
//! nothing more than "not yet".

use crate::error::{Result, StreamError};
use crate::pipeline::types::RawFrame;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

/// Item carried by the transfer queue.
#[derive(Debug)]
pub enum QueueItem<T> {
    Item(T),
    EndOfStream,
}

/// Producer-to-consumer completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSignal {
    /// More items may follow.
    Held,
    /// The producer has pushed its final item.
    Released,
}

/// Sending half of the transfer queue.
#[derive(Debug)]
pub struct StreamProducer<T> {
    tx: Sender<QueueItem<T>>,
}

impl<T> StreamProducer<T> {
    /// Pushes one item. Blocks while a bounded queue is full; items are
    /// never dropped.
    pub fn push(&self, item: T) -> Result<()> {
        self.tx
            .send(QueueItem::Item(item))
            .map_err(|_| StreamError::ConsumerCrash {
                message: "transfer queue closed by consumer".to_string(),
            })
    }

    /// Releases the completion signal.
    ///
    /// Takes `self`, so it happens at most once and nothing can be pushed
    /// after it.
    pub fn release(self) -> Result<()> {
        self.tx
            .send(QueueItem::EndOfStream)
            .map_err(|_| StreamError::ConsumerCrash {
                message: "transfer queue closed by consumer before end of stream".to_string(),
            })
    }
}

/// Receiving half of the transfer queue.
#[derive(Debug)]
pub struct StreamConsumer<T> {
    rx: Receiver<QueueItem<T>>,
    signal: CompletionSignal,
}

impl<T> StreamConsumer<T> {
    /// Blocks for the next item.
    ///
    /// Returns `Ok(None)` once the end-of-stream marker has been received.
    /// A producer that vanished without releasing is reported as
    /// [`StreamError::ProducerCrash`].
    pub fn recv(&mut self) -> Result<Option<T>> {
        if self.signal == CompletionSignal::Released {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(QueueItem::Item(item)) => Ok(Some(item)),
            Ok(QueueItem::EndOfStream) => {
                self.signal = CompletionSignal::Released;
                Ok(None)
            }
            Err(_) => Err(StreamError::ProducerCrash {
                message: "transfer queue closed without end-of-stream marker".to_string(),
            }),
        }
    }

    /// Completion state as observed by this consumer.
    pub fn signal(&self) -> CompletionSignal {
        self.signal
    }

    /// Number of queued entries, the end-of-stream marker included.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Creates a transfer queue. `None` capacity means unbounded.
pub fn stream_queue<T>(capacity: Option<usize>) -> (StreamProducer<T>, StreamConsumer<T>) {
    let (tx, rx) = match capacity {
        Some(cap) => bounded(cap),
        None => unbounded(),
    };
    (
        StreamProducer { tx },
        StreamConsumer {
            rx,
            signal: CompletionSignal::Held,
        },
    )
}

pub type FrameProducer = StreamProducer<RawFrame>;
pub type FrameConsumer = StreamConsumer<RawFrame>;
