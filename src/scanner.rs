use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use crate::advertisement::{AdvertisementMatch, BeaconFilter, ScanResult};
use crate::queue::QueueProducer;

/// One bounded scan of nearby advertisers.
#[async_trait]
pub trait ScanSource: Send {
    async fn scan(&mut self, max_results: usize) -> anyhow::Result<Vec<ScanResult>>;
}

/// Returned by a [`ScanSource`] that will never produce results again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceClosed;

impl fmt::Display for SourceClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scan source closed")
    }
}

impl std::error::Error for SourceClosed {}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub seen: usize,
    pub matched: usize,
    pub dropped: usize,
    pub failed: bool,
}

pub struct Scanner<S> {
    source: S,
    filter: BeaconFilter,
    queue: QueueProducer,
    max_results: usize,
    error_backoff: Duration,
}

impl<S: ScanSource> Scanner<S> {
    pub fn new(source: S, filter: BeaconFilter, queue: QueueProducer, max_results: usize) -> Self {
        Scanner {
            source,
            filter,
            queue,
            max_results,
            error_backoff: Duration::from_millis(crate::config::DEFAULT_SCAN_TIMEOUT_MILLIS),
        }
    }

    /// Delay before the next pass after a failed scan.
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Scans until the task is aborted or the source closes, yielding
    /// between passes.
    pub async fn run(mut self) {
        loop {
            let summary = match self.scan_pass().await {
                Ok(summary) => summary,
                Err(SourceClosed) => {
                    warn!("Scan source closed, stopping scanner");
                    return;
                }
            };
            if summary.failed {
                tokio::time::sleep(self.error_backoff).await;
                continue;
            }
            if summary.matched > 0 {
                debug!(
                    "Scan pass: {} seen, {} matched, {} dropped",
                    summary.seen, summary.matched, summary.dropped
                );
            }
            tokio::task::yield_now().await;
        }
    }

    pub async fn scan_pass(&mut self) -> Result<PassSummary, SourceClosed> {
        let mut summary = PassSummary::default();
        let results = match self.source.scan(self.max_results).await {
            Ok(results) => results,
            Err(err) if err.is::<SourceClosed>() => return Err(SourceClosed),
            Err(err) => {
                warn!("Scan failed: {:?}", err);
                summary.failed = true;
                return Ok(summary);
            }
        };

        for result in results.iter().take(self.max_results) {
            summary.seen += 1;
            match self.filter.parse(result) {
                AdvertisementMatch::Matched(reading) => {
                    summary.matched += 1;
                    if !self.queue.put(reading) {
                        summary.dropped += 1;
                    }
                }
                AdvertisementMatch::TooShort(len) => {
                    debug!(
                        "Ignoring {} with {} byte manufacturer payload",
                        result.address, len
                    );
                }
                AdvertisementMatch::TypeMismatch(type_id) => {
                    debug!("Ignoring {} with device type {:02X}", result.address, type_id);
                }
                AdvertisementMatch::NameMismatch | AdvertisementMatch::AddressMismatch => {}
            }
        }
        Ok(summary)
    }
}
