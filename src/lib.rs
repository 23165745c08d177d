pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod queue;
pub mod rate_limit;
pub mod retry;
pub mod routes;
pub mod sink;
pub mod state;
pub mod store;
pub mod submission;
pub mod worker;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::events::{EventBus, EventPublisher};
use crate::queue::SubmissionQueue;
use crate::rate_limit::SubmissionRateLimiter;
use crate::retry::RetryEngine;
use crate::sink::SubmissionSink;
use crate::state::{AppState, SharedState};
use crate::store::{LocalStore, StorageProvider};

/// Wire the queue, retry engine and event bus over the given storage and
/// sink, and build the HTTP router on top.
pub fn build_app(
    config: Config,
    storage: Arc<dyn StorageProvider>,
    sink: Arc<dyn SubmissionSink>,
) -> (Router, SharedState) {
    let queue = Arc::new(SubmissionQueue::new(LocalStore::new(storage)));
    let events: Arc<dyn EventPublisher> = Arc::new(EventBus::new());
    let retry = Arc::new(RetryEngine::new(
        queue.clone(),
        sink.clone(),
        events.clone(),
        config.delivery_timeout,
    ));

    let pending = queue.count();
    if pending > 0 {
        tracing::info!("{pending} pending submission(s) carried over from a previous run");
    }

    let state: SharedState = Arc::new(AppState {
        submission_limiter: SubmissionRateLimiter::new(
            config.rate_limit,
            config.rate_limit_window,
        ),
        config,
        queue,
        sink,
        events,
        retry,
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::form_routes(&state.config.allowed_origins))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
                // Security headers
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
