use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use uuid::Uuid;

use super::model::SecretRecord;

/// Failure outcomes of the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The id was never issued, or its secret was already retrieved.
    #[error("not found or already retrieved")]
    NotFound,
    /// `create` was called with an empty ciphertext.
    #[error("ciphertext must not be empty")]
    EmptyCiphertext,
}

/// Thread-safe handle to the in-memory secret map.
///
/// Every successful [`Store::take_and_remove`] removes the record in the same
/// locked step that returns it, so a secret is handed out at most once.
/// There is deliberately no way to look at a record without consuming it.
#[derive(Clone, Default)]
pub struct Store {
    secrets: Arc<Mutex<HashMap<String, SecretRecord>>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    // A panic while holding the lock cannot leave the map half-updated
    // (every critical section is a single insert or remove), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SecretRecord>> {
        self.secrets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `ciphertext` under a fresh random id and return the id.
    pub fn create(&self, ciphertext: &str) -> Result<String, StoreError> {
        if ciphertext.is_empty() {
            return Err(StoreError::EmptyCiphertext);
        }

        let record = SecretRecord::new(ciphertext.to_owned(), Self::now());
        let mut secrets = self.lock();
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !secrets.contains_key(&candidate) {
                break candidate;
            }
        };
        secrets.insert(id.clone(), record);
        let live = secrets.len();
        drop(secrets);

        debug!(live, "stored secret");
        Ok(id)
    }

    /// Remove the record for `id` and return its ciphertext.
    /// Returns `StoreError::NotFound` if the id is unknown or was already taken.
    pub fn take_and_remove(&self, id: &str) -> Result<String, StoreError> {
        let record = self.lock().remove(id).ok_or(StoreError::NotFound)?;
        debug!(age_secs = Self::now() - record.created_at, "secret taken");
        Ok(record.into_ciphertext())
    }

    /// Number of live (not yet retrieved) secrets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
