use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::models::FormType;

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryError {
    Transport(String),
    Rejected { status: u16, body: String },
    Timeout,
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Transport(msg) => write!(f, "Delivery failed: {msg}"),
            DeliveryError::Rejected { status, body } => {
                write!(f, "Backend rejected submission ({status}): {body}")
            }
            DeliveryError::Timeout => write!(f, "Delivery timed out"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// The remote backend that durably accepts form submissions.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(
        &self,
        form_type: FormType,
        payload: &Map<String, Value>,
    ) -> Result<(), DeliveryError>;
}

/// Run one delivery bounded by `timeout`; elapsing counts as a failure.
pub async fn deliver(
    sink: &dyn SubmissionSink,
    form_type: FormType,
    payload: &Map<String, Value>,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(timeout, sink.submit(form_type, payload)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout),
    }
}

/// Inserts submissions into Supabase tables through the PostgREST API.
pub struct SupabaseSink {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseSink {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn table_for(form_type: FormType) -> &'static str {
        match form_type {
            FormType::Contact => "contact_submissions",
            FormType::Newsletter => "newsletter_subscribers",
            FormType::Project => "project_submissions",
            FormType::ScheduleCall => "call_requests",
        }
    }
}

#[async_trait]
impl SubmissionSink for SupabaseSink {
    async fn submit(
        &self,
        form_type: FormType,
        payload: &Map<String, Value>,
    ) -> Result<(), DeliveryError> {
        let url = format!("{}/rest/v1/{}", self.base_url, Self::table_for(form_type));

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Timeout
                } else {
                    DeliveryError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(1024)
            .collect::<String>();

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
