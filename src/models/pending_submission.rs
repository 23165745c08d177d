use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FormType;

/// A form payload that has not yet been confirmed by the backend.
///
/// Field names are camelCase on disk; anything else reading the
/// `pendingSubmissions` slot depends on that layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSubmission {
    pub id: Uuid,
    pub form_type: FormType,
    pub payload: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl PendingSubmission {
    pub fn new(form_type: FormType, payload: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: Uuid::now_v7(),
            form_type,
            payload,
            created_at: Utc::now(),
            attempt_count: 0,
            last_attempt_at: None,
        }
    }
}
