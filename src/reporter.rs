use log::{error, info};

use crate::messages::{EventKind, Reading, ReadingPayload};
use crate::tracker::Classification;

/// Destination for published events. Fire-and-forget: implementations must
/// not block and report their own failures.
pub trait ReportSink: Send {
    fn publish(&self, event: EventKind, payload: String);
}

/// Sink used for `--dry-run`.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn publish(&self, event: EventKind, payload: String) {
        info!("[{}] {}", event.name(), payload);
    }
}

pub struct Reporter<S> {
    sink: S,
}

impl<S: ReportSink> Reporter<S> {
    pub fn new(sink: S) -> Self {
        Reporter { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Emits the events implied by `classification`: nothing, Data, or Data
    /// followed by Warning.
    pub fn report(&self, reading: &Reading, classification: Classification) {
        if classification.emits_data() {
            self.emit(EventKind::Data, reading);
        }
        if classification.emits_warning() {
            self.emit(EventKind::Warning, reading);
        }
    }

    fn emit(&self, event: EventKind, reading: &Reading) {
        let payload = match ReadingPayload::from(reading).render() {
            Ok(payload) => payload,
            Err(err) => {
                error!("Error encoding {} payload: {:?}", event.name(), err);
                return;
            }
        };
        info!(
            "Publishing {} for control byte {:02X}",
            event.name(),
            reading.control_byte
        );
        self.sink.publish(event, payload);
    }
}
