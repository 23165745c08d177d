use std::net::IpAddr;

use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::{FormType, PendingSubmission};
use crate::sink;
use crate::state::SharedState;

use super::fields;
use super::honeypot;

pub enum PipelineResult {
    Delivered,
    Queued(PendingSubmission),
    Spam,
}

/// Screen a parsed form post and hand it to the backend, falling back to
/// the pending queue when the backend cannot be reached.
pub async fn run(
    state: &SharedState,
    form_type: FormType,
    client_ip: IpAddr,
    mut data: Map<String, Value>,
) -> Result<PipelineResult, AppError> {
    if let Err(retry_after) = state.submission_limiter.check(form_type, client_ip) {
        return Err(AppError::RateLimited(format!(
            "Rate limited. Retry after {retry_after}s"
        )));
    }

    let honeypot_field = state.config.honeypot_field.as_deref();
    if honeypot::is_spam(&data, honeypot_field) {
        tracing::debug!("Dropping {form_type} submission from {client_ip}: honeypot filled");
        return Ok(PipelineResult::Spam);
    }
    honeypot::strip(&mut data, honeypot_field);

    fields::validate(form_type, &data).map_err(|errors| AppError::BadRequest(errors.join("; ")))?;

    match sink::deliver(
        state.sink.as_ref(),
        form_type,
        &data,
        state.config.delivery_timeout,
    )
    .await
    {
        Ok(()) => {
            tracing::info!("Delivered {form_type} submission");
            Ok(PipelineResult::Delivered)
        }
        Err(e) => {
            tracing::warn!("Backend unavailable for {form_type} submission, queueing: {e}");
            let record = state
                .queue
                .blocking(move |q| q.enqueue(form_type, data))
                .await??;
            Ok(PipelineResult::Queued(record))
        }
    }
}
