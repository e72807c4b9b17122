//! Repository port for manifest record persistence and discovery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::registry::discovery::DiscoveryQuery;
use crate::registry::domain::{AgentId, ManifestPatch, ManifestRecord};

/// Result type for manifest store operations.
pub type StoreResult<T> = Result<T, ManifestStoreError>;

/// Manifest persistence contract.
///
/// Per-id operations are linearizable at the storage layer: each insert,
/// update, delete, and heartbeat touch is a single atomic statement, and a
/// registered record is immediately visible to a subsequent get. There is
/// no ordering guarantee across distinct ids.
#[async_trait]
pub trait ManifestRepository: Send + Sync {
    /// Stores a new record under its pre-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestStoreError::DuplicateId`] when the id already
    /// exists; an existing record is never silently overwritten.
    async fn insert(&self, record: &ManifestRecord) -> StoreResult<()>;

    /// Finds a record by identifier. Returns `None` when it does not exist.
    async fn get(&self, id: AgentId) -> StoreResult<Option<ManifestRecord>>;

    /// Merges a partial manifest update into the stored record.
    ///
    /// Only the fields present in the patch change; record metadata (id,
    /// owner, timestamps) is never mutated by this operation. Returns
    /// `false` without side effects when the id is unknown.
    async fn update(&self, id: AgentId, patch: &ManifestPatch) -> StoreResult<bool>;

    /// Removes a record. Returns `false` when the id is unknown.
    async fn delete(&self, id: AgentId) -> StoreResult<bool>;

    /// Sets `last_heartbeat` to `now` as one atomic write, so concurrent
    /// touches for the same id cannot lose an update. Returns `false` when
    /// the id is unknown.
    async fn touch_heartbeat(&self, id: AgentId, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Returns every record satisfying the query, ordered most recently
    /// registered first (ties broken by insertion sequence, later first).
    ///
    /// The `now` instant anchors every liveness evaluation in this scan.
    async fn find(
        &self,
        query: &DiscoveryQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ManifestRecord>>;

    /// Returns the number of stored records.
    async fn count(&self) -> StoreResult<u64>;
}

/// Errors returned by manifest store implementations.
#[derive(Debug, Clone, Error)]
pub enum ManifestStoreError {
    /// A record with the same identifier already exists.
    #[error("duplicate agent identifier: {0}")]
    DuplicateId(AgentId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure: the backend cannot be reached or the
    /// statement failed. Not retried internally.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ManifestStoreError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
