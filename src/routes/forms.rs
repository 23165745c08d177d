use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::AppError;
use crate::models::FormType;
use crate::state::SharedState;
use crate::submission::pipeline::{self, PipelineResult};
use crate::submission::{metadata, parser};

pub async fn submit(
    State(state): State<SharedState>,
    Path(form_type): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let form_type: FormType = form_type
        .parse()
        .map_err(|_| AppError::NotFound("Form not found".to_string()))?;

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());

    let data = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body)
            .await
            .map_err(AppError::BadRequest)?
    } else {
        parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?
    };

    let client_ip = metadata::client_ip(&headers, Some(addr.ip()), &state.config.trusted_proxies);

    let response = match pipeline::run(&state, form_type, client_ip, data).await? {
        // Silent 200 for spam
        PipelineResult::Spam => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        PipelineResult::Delivered => (StatusCode::CREATED, Json(json!({ "status": "delivered" }))),
        PipelineResult::Queued(record) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "status": "queued",
                "pending_id": record.id,
            })),
        ),
    };

    Ok(response.into_response())
}
