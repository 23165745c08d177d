pub mod forms;
pub mod pending;

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/v1/pending",
            get(pending::list).delete(pending::clear),
        )
        .route("/api/v1/pending/retry", post(pending::retry))
        .route("/api/v1/pending/events", get(pending::events))
        .route("/api/v1/pending/{id}", delete(pending::remove))
}

pub fn form_routes(allowed_origins: &[String]) -> Router<SharedState> {
    Router::new()
        .route("/v1/forms/{form_type}", post(forms::submit))
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin: {o}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
