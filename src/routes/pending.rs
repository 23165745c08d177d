use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::PENDING_SUBMISSIONS_PROCESSED;
use crate::state::SharedState;

pub async fn list(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    let submissions = state.queue.blocking(|q| q.list()).await?;

    Ok(Json(json!({
        "count": submissions.len(),
        "retrying": state.retry.is_running(),
        "submissions": submissions,
    })))
}

/// Manual "retry now". Delivery failures are reported, not raised.
///
/// The sweep runs on its own task so a client hanging up does not cut it
/// short.
pub async fn retry(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    let engine = state.retry.clone();
    let report = tokio::spawn(async move { engine.retry_all().await })
        .await
        .map_err(|e| AppError::Internal(format!("Retry task failed: {e}")))??;
    let remaining = state.queue.blocking(|q| q.count()).await?;

    Ok(Json(json!({
        "succeeded": report.succeeded,
        "failed": report.failed,
        "remaining": remaining,
    })))
}

/// "Clear Saved Data".
pub async fn clear(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    state.queue.blocking(|q| q.clear_all()).await?;
    Ok(Json(json!({ "status": "cleared" })))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid submission id".to_string()))?;
    state.queue.blocking(move |q| q.remove_by_id(id)).await??;
    Ok(Json(json!({ "status": "deleted" })))
}

/// Server-sent stream of processed events. Each event carries the number of
/// submissions still pending. The bus subscription lives as long as the
/// connection.
pub async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<()>();
    let subscription = state.events.subscribe(
        PENDING_SUBMISSIONS_PROCESSED,
        Arc::new(move || {
            let _ = tx.send(());
        }),
    );

    let queue = state.queue.clone();
    let stream = futures_util::stream::unfold(
        (rx, subscription, queue),
        |(mut rx, subscription, queue)| async move {
            rx.recv().await?;
            let remaining = queue.blocking(|q| q.count()).await.unwrap_or_default();
            let event = Event::default()
                .event(PENDING_SUBMISSIONS_PROCESSED)
                .data(remaining.to_string());
            Some((Ok::<_, Infallible>(event), (rx, subscription, queue)))
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}
