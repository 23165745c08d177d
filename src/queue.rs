use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{FormType, PendingSubmission};
use crate::store::{LocalStore, StorageError};

/// Pending-submission queue over the local store.
///
/// Every operation is a whole-list read-modify-write against the store; no
/// state is cached between calls. The mutex only serializes those cycles
/// inside this process so intake and retry never overwrite each other.
pub struct SubmissionQueue {
    store: LocalStore,
    write_lock: Mutex<()>,
}

impl SubmissionQueue {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run a queue operation on the blocking pool. Storage backends do file
    /// I/O and fsync under the write lock, which must stay off runtime threads.
    pub async fn blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&SubmissionQueue) -> T + Send + 'static,
        T: Send + 'static,
    {
        let queue = self.clone();
        tokio::task::spawn_blocking(move || op(&queue))
            .await
            .map_err(|e| StorageError::Unavailable(format!("Queue task failed: {e}")))
    }

    pub fn enqueue(
        &self,
        form_type: FormType,
        payload: Map<String, Value>,
    ) -> Result<PendingSubmission, StorageError> {
        let _guard = self.lock();
        let record = PendingSubmission::new(form_type, payload);

        let mut list = self.store.load();
        list.push(record.clone());
        self.store.save(&list)?;

        tracing::info!("Queued {form_type} submission {} ({} pending)", record.id, list.len());
        Ok(record)
    }

    pub fn count(&self) -> usize {
        self.store.load().len()
    }

    pub fn list(&self) -> Vec<PendingSubmission> {
        self.store.load()
    }

    pub fn remove_by_id(&self, id: Uuid) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut list = self.store.load();
        let before = list.len();
        list.retain(|s| s.id != id);

        if list.len() == before {
            return Ok(());
        }
        self.store.save(&list)
    }

    /// Bump the attempt counter of one record in place. Returns the updated
    /// record, or `None` if it is no longer queued.
    pub fn record_attempt(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<PendingSubmission>, StorageError> {
        let _guard = self.lock();
        let mut list = self.store.load();

        let Some(record) = list.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        record.attempt_count = record.attempt_count.saturating_add(1);
        record.last_attempt_at = Some(at);
        let updated = record.clone();

        self.store.save(&list)?;
        Ok(Some(updated))
    }

    pub fn clear_all(&self) {
        let _guard = self.lock();
        self.store.clear();
        tracing::info!("Cleared all pending submissions");
    }
}
