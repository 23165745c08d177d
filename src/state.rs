use std::sync::Arc;

use crate::config::Config;
use crate::events::EventPublisher;
use crate::queue::SubmissionQueue;
use crate::rate_limit::SubmissionRateLimiter;
use crate::retry::RetryEngine;
use crate::sink::SubmissionSink;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub queue: Arc<SubmissionQueue>,
    pub sink: Arc<dyn SubmissionSink>,
    pub events: Arc<dyn EventPublisher>,
    pub retry: Arc<RetryEngine>,
    pub submission_limiter: SubmissionRateLimiter,
}
