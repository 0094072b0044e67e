//! Record and publication store contracts
//!
//! The orchestrator needs get/put-by-id with last-write-wins for records and
//! an idempotent blob sink for published documents. In-memory
//! implementations back tests and the CLI.

use crate::error::StoreError;
use crate::types::{GameId, GameRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Content type of published documents
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Persistence of game records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Store a new record
    ///
    /// # Errors
    /// Returns error if the id exists or the store is unreachable
    async fn insert(&self, record: GameRecord) -> Result<(), StoreError>;

    /// Fetch a record
    ///
    /// # Errors
    /// Returns error if the store is unreachable
    async fn get(&self, id: GameId) -> Result<Option<GameRecord>, StoreError>;

    /// Overwrite a record (last write wins)
    ///
    /// # Errors
    /// Returns error if the store is unreachable
    async fn put(&self, record: GameRecord) -> Result<(), StoreError>;
}

/// A stored document with its content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Public hosting of compiled documents
#[async_trait]
pub trait PublicationStore: Send + Sync + std::fmt::Debug {
    /// Write a document, replacing any previous version
    ///
    /// # Errors
    /// Returns error if the store is unreachable
    async fn put(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError>;

    /// Read a published document
    ///
    /// # Errors
    /// Returns error if the store is unreachable
    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError>;
}

/// In-memory record store
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<DashMap<GameId, GameRecord>>,
}

impl MemoryRecordStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: GameRecord) -> Result<(), StoreError> {
        match self.records.entry(record.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Duplicate(record.id.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, id: GameId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn put(&self, record: GameRecord) -> Result<(), StoreError> {
        self.records.insert(record.id, record);
        Ok(())
    }
}

/// In-memory publication store
#[derive(Debug, Clone, Default)]
pub struct MemoryPublicationStore {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryPublicationStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored paths, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl PublicationStore for MemoryPublicationStore {
    async fn put(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.objects.insert(
            path.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.objects.get(path).map(|o| o.value().clone()))
    }
}
