//! Storage abstractions for the directory
//!
//! The user collection is always loaded and saved as a whole; there are no
//! per-record operations at this layer.

pub mod json_array_store;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::directory::domain::StoredEntry;
use crate::errors::DirectoryError;

pub use json_array_store::JsonArrayStore;

/// Whole-collection persistence for user records.
/// Implementations can be file-backed, an embedded database, or in-memory.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Current collection in stored order, non-user elements included.
    /// Unreadable content yields an empty collection; only I/O faults are errors.
    async fn load(&self) -> Result<Vec<StoredEntry>, DirectoryError>;

    /// Replace the stored collection with `entries`.
    async fn save_all(&self, entries: &[StoredEntry]) -> Result<(), DirectoryError>;

    /// Lock shared by every handle onto the same underlying collection.
    /// Held across a load-modify-save cycle when writes are serialized.
    fn write_lock(&self) -> Arc<Mutex<()>>;
}

/// Simple in-memory mock store for tests and doc examples
pub mod mock {
    use super::*;

    use crate::directory::domain::UserRecord;

    #[derive(Default)]
    pub struct MemoryUserStore {
        entries: std::sync::Mutex<Vec<StoredEntry>>,
        saves: std::sync::Mutex<usize>,
        lock: Arc<Mutex<()>>,
    }

    impl MemoryUserStore {
        pub fn with_records(records: Vec<UserRecord>) -> Self {
            Self::with_entries(records.into_iter().map(StoredEntry::from).collect())
        }

        pub fn with_entries(entries: Vec<StoredEntry>) -> Self {
            Self { entries: std::sync::Mutex::new(entries), ..Default::default() }
        }

        /// Number of `save_all` calls so far.
        pub fn save_count(&self) -> usize {
            *self.saves.lock().unwrap_or_else(|p| p.into_inner())
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn load(&self) -> Result<Vec<StoredEntry>, DirectoryError> {
            let entries = self.entries.lock().map_err(|e| DirectoryError::Storage(e.to_string()))?;
            Ok(entries.clone())
        }

        async fn save_all(&self, entries: &[StoredEntry]) -> Result<(), DirectoryError> {
            let mut stored = self.entries.lock().map_err(|e| DirectoryError::Storage(e.to_string()))?;
            *stored = entries.to_vec();
            *self.saves.lock().map_err(|e| DirectoryError::Storage(e.to_string()))? += 1;
            Ok(())
        }

        fn write_lock(&self) -> Arc<Mutex<()>> {
            self.lock.clone()
        }
    }
}
