//! Session persistence
//!
//! One canonical record, `{token, profile}`, saved and cleared as a whole.

pub mod json_record_store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use models::Session;

use crate::errors::StorageError;

pub use json_record_store::JsonRecordStore;

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Session>, StorageError>;
    async fn save(&self, session: &Session) -> Result<(), StorageError>;
    /// Removing a record that is not there is not an error.
    async fn clear(&self) -> Result<(), StorageError>;
}

#[async_trait]
impl SessionStorage for JsonRecordStore<Session> {
    async fn load(&self) -> Result<Option<Session>, StorageError> { self.load().await }
    async fn save(&self, session: &Session) -> Result<(), StorageError> { self.save(session).await }
    async fn clear(&self) -> Result<(), StorageError> { self.clear().await }
}

/// Process-local storage; nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStorage {
    record: Mutex<Option<Session>>,
    failing: AtomicBool,
}

impl MemorySessionStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_session(session: Session) -> Self {
        Self { record: Mutex::new(Some(session)), failing: AtomicBool::new(false) }
    }

    /// Make subsequent writes fail, simulating a full disk.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// What a restarted client would read back.
    pub fn snapshot(&self) -> Option<Session> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write(&self, value: Option<Session>) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("storage unavailable")));
        }
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = value;
        Ok(())
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.snapshot())
    }

    async fn save(&self, session: &Session) -> Result<(), StorageError> {
        self.write(Some(session.clone()))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.write(None)
    }
}
