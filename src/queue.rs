use log::debug;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::messages::Reading;

/// Bounded FIFO hand-off between the scanner and the consumer.
///
/// Both ends are non-blocking. A full queue drops the reading, an empty
/// queue yields `None`.
pub fn reading_queue(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueProducer { tx }, QueueConsumer { rx })
}

#[derive(Debug)]
pub struct QueueProducer {
    tx: mpsc::Sender<Reading>,
}

impl QueueProducer {
    /// Returns `false` when the reading was dropped.
    pub fn put(&self, reading: Reading) -> bool {
        match self.tx.try_send(reading) {
            Ok(()) => true,
            Err(TrySendError::Full(reading)) => {
                debug!("Queue full, dropping control byte {:02X}", reading.control_byte);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Queue consumer gone, dropping reading");
                false
            }
        }
    }
}

#[derive(Debug)]
pub struct QueueConsumer {
    rx: mpsc::Receiver<Reading>,
}

impl QueueConsumer {
    pub fn take(&mut self) -> Option<Reading> {
        match self.rx.try_recv() {
            Ok(reading) => Some(reading),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
