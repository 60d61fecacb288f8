//! Asynchronous click analytics recording.
//!
//! The request path only ever calls [`AnalyticsRecorder::record`], which is a
//! non-blocking enqueue. A single background worker drains the bounded queue,
//! groups events into batches and delivers them to the [`AnalyticsSink`] with
//! bounded exponential backoff. Delivery failures end in a log line and a
//! metric; they never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use crate::config::AnalyticsSettings;
use crate::domain::entities::AnalyticsEvent;
use crate::domain::repositories::AnalyticsSink;

/// Backoff delays are 50ms, 100ms, 200ms, ... before jitter.
const RETRY_BASE_MS: u64 = 2;
const RETRY_FACTOR: u64 = 25;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Cloneable handle to the analytics queue.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    tx: mpsc::Sender<AnalyticsEvent>,
}

impl AnalyticsRecorder {
    /// Creates the queue and spawns its worker on the current runtime.
    ///
    /// The worker exits after draining the queue once every handle is dropped.
    pub fn spawn(
        sink: Arc<dyn AnalyticsSink>,
        settings: AnalyticsSettings,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(settings.queue_capacity);
        let handle = tokio::spawn(run_worker(rx, sink, settings));
        (Self { tx }, handle)
    }

    /// Enqueues an event without waiting.
    ///
    /// Returns `false` if the event was dropped because the queue is full or
    /// the worker has stopped.
    pub fn record(&self, event: AnalyticsEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                counter!("analytics_events_dropped_total", "reason" => "full").increment(1);
                warn!(slug = %event.slug, "Analytics queue full, dropping event");
                false
            }
            Err(TrySendError::Closed(event)) => {
                counter!("analytics_events_dropped_total", "reason" => "closed").increment(1);
                debug!(slug = %event.slug, "Analytics worker stopped, dropping event");
                false
            }
        }
    }

    /// Number of events waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn queue_capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Returns true while the worker is accepting events.
    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<AnalyticsEvent>,
    sink: Arc<dyn AnalyticsSink>,
    settings: AnalyticsSettings,
) {
    info!(
        "Analytics worker started (batch size {}, flush interval {:?})",
        settings.batch_size, settings.flush_interval
    );

    let mut batch = Vec::with_capacity(settings.batch_size);
    let mut ticker = tokio::time::interval(settings.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= settings.batch_size {
                        flush(sink.as_ref(), &mut batch, settings.max_retries).await;
                    }
                }
                None => {
                    flush(sink.as_ref(), &mut batch, settings.max_retries).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    flush(sink.as_ref(), &mut batch, settings.max_retries).await;
                }
            }
        }
    }

    info!("Analytics worker stopped");
}

async fn flush(sink: &dyn AnalyticsSink, batch: &mut Vec<AnalyticsEvent>, max_retries: usize) {
    if batch.is_empty() {
        return;
    }

    let events = std::mem::take(batch);
    let strategy = ExponentialBackoff::from_millis(RETRY_BASE_MS)
        .factor(RETRY_FACTOR)
        .max_delay(RETRY_MAX_DELAY)
        .map(jitter)
        .take(max_retries);

    match Retry::spawn(strategy, || sink.write(&events)).await {
        Ok(()) => {
            counter!("analytics_events_flushed_total").increment(events.len() as u64);
            debug!("Flushed {} analytics events", events.len());
        }
        Err(e) => {
            counter!("analytics_flush_failures_total").increment(1);
            counter!("analytics_events_dropped_total", "reason" => "sink").increment(events.len() as u64);
            error!(
                "Dropping {} analytics events after {} retries: {}",
                events.len(),
                max_retries,
                e
            );
        }
    }
}
