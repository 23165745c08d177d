use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::events::{EventPublisher, PENDING_SUBMISSIONS_PROCESSED};
use crate::models::PendingSubmission;
use crate::queue::SubmissionQueue;
use crate::sink::{self, SubmissionSink};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    pub succeeded: Vec<PendingSubmission>,
    pub failed: Vec<PendingSubmission>,
}

impl RetryReport {
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryError {
    InProgress,
}

impl std::fmt::Display for RetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::InProgress => write!(f, "A retry is already in progress"),
        }
    }
}

impl std::error::Error for RetryError {}

/// Releases the in-flight flag however the run ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Publishes the processed event when dropped, if anything was delivered.
/// A sweep cancelled mid-loop has already dequeued its deliveries, so
/// listeners still need to hear about them.
struct ProcessedNotice<'a> {
    events: &'a dyn EventPublisher,
    delivered: usize,
}

impl Drop for ProcessedNotice<'_> {
    fn drop(&mut self) {
        if self.delivered > 0 {
            self.events.publish(PENDING_SUBMISSIONS_PROCESSED);
        }
    }
}

/// Re-sends queued submissions to the sink and reconciles the queue.
pub struct RetryEngine {
    queue: Arc<SubmissionQueue>,
    sink: Arc<dyn SubmissionSink>,
    events: Arc<dyn EventPublisher>,
    timeout: Duration,
    in_flight: AtomicBool,
}

impl RetryEngine {
    pub fn new(
        queue: Arc<SubmissionQueue>,
        sink: Arc<dyn SubmissionSink>,
        events: Arc<dyn EventPublisher>,
        timeout: Duration,
    ) -> Self {
        Self {
            queue,
            sink,
            events,
            timeout,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// One sweep over the queue, oldest first, one record at a time.
    ///
    /// Delivery failures never escape: the record stays queued with its
    /// attempt counter bumped. The only error is a run already in flight.
    pub async fn retry_all(&self) -> Result<RetryReport, RetryError> {
        let _guard = InFlight::acquire(&self.in_flight).ok_or(RetryError::InProgress)?;

        let mut report = RetryReport::default();
        let snapshot = match self.queue.blocking(|q| q.list()).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!("Failed to read pending submissions: {e}");
                return Ok(report);
            }
        };
        if snapshot.is_empty() {
            return Ok(report);
        }

        tracing::debug!("Retrying {} pending submission(s)", snapshot.len());
        let mut notice = ProcessedNotice {
            events: self.events.as_ref(),
            delivered: 0,
        };

        for record in snapshot {
            match sink::deliver(self.sink.as_ref(), record.form_type, &record.payload, self.timeout)
                .await
            {
                Ok(()) => {
                    let id = record.id;
                    let dequeued = self.queue.blocking(move |q| q.remove_by_id(id)).await;
                    if let Err(e) = dequeued.and_then(|r| r) {
                        tracing::error!("Delivered {id} but failed to dequeue it: {e}");
                    }
                    notice.delivered += 1;
                    report.succeeded.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        "Retry of {} submission {} failed (attempt {}): {e}",
                        record.form_type,
                        record.id,
                        record.attempt_count + 1
                    );
                    let id = record.id;
                    let attempt = self
                        .queue
                        .blocking(move |q| q.record_attempt(id, Utc::now()))
                        .await
                        .and_then(|r| r);
                    let updated = match attempt {
                        Ok(Some(updated)) => updated,
                        Ok(None) => record,
                        Err(e) => {
                            tracing::error!("Failed to persist attempt for {id}: {e}");
                            record
                        }
                    };
                    report.failed.push(updated);
                }
            }
        }

        if !report.succeeded.is_empty() {
            tracing::info!(
                "Delivered {} pending submission(s), {} still pending",
                report.succeeded.len(),
                report.failed.len()
            );
        }

        Ok(report)
    }
}
