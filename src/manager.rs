use std::future::Future;
use std::time::Duration;

use log::{error, info};
use tokio::time::MissedTickBehavior;

use crate::advertisement::BeaconFilter;
use crate::config::ScanConfig;
use crate::queue::{QueueConsumer, reading_queue};
use crate::reporter::{ReportSink, Reporter};
use crate::scanner::{ScanSource, Scanner};
use crate::tracker::{Classification, SequenceTracker};

/// Consumer side of the pipeline: takes readings off the queue, classifies
/// them and reports the result.
pub struct Consumer<R> {
    queue: QueueConsumer,
    tracker: SequenceTracker,
    reporter: Reporter<R>,
}

impl<R: ReportSink> Consumer<R> {
    pub fn new(queue: QueueConsumer, sink: R) -> Self {
        Consumer {
            queue,
            tracker: SequenceTracker::new(),
            reporter: Reporter::new(sink),
        }
    }

    /// Handles at most one reading. Returns `None` if the queue was empty.
    pub fn poll(&mut self) -> Option<Classification> {
        let reading = self.queue.take()?;
        let classification = self.tracker.observe(&reading);
        self.reporter.report(&reading, classification);
        Some(classification)
    }

    /// Polls until the queue is empty. Returns how many readings were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while self.poll().is_some() {
            handled += 1;
        }
        handled
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    pub fn reporter(&self) -> &Reporter<R> {
        &self.reporter
    }
}

pub struct Manager<S, R> {
    scanner: Scanner<S>,
    consumer: Consumer<R>,
    poll_interval: Duration,
}

impl<S, R> Manager<S, R>
where
    S: ScanSource + 'static,
    R: ReportSink,
{
    pub fn new(source: S, sink: R, config: &ScanConfig) -> Self {
        let (producer, queue) = reading_queue(config.queue_capacity());
        let filter = BeaconFilter::new(config.device_address);
        Manager {
            scanner: Scanner::new(source, filter, producer, config.max_results())
                .error_backoff(config.scan_timeout()),
            consumer: Consumer::new(queue, sink),
            poll_interval: config.poll_interval(),
        }
    }

    pub async fn run_loop(self) -> Consumer<R> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Error waiting for Ctrl-C: {:?}", err);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs the scanner task and polls the consumer until `shutdown`
    /// resolves or the scanner stops.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Consumer<R> {
        let Manager {
            scanner,
            mut consumer,
            poll_interval,
        } = self;

        let mut scanner_handle = tokio::task::spawn(scanner.run());

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
                result = &mut scanner_handle => {
                    error!("Scanner task exited: {:?}", result);
                    break;
                }
                _ = ticker.tick() => {
                    consumer.drain();
                }
            }
        }

        scanner_handle.abort();
        info!("Exiting manager event loop");
        consumer
    }
}
