//! In-memory manifest store for tests and embedded use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::registry::discovery::DiscoveryQuery;
use crate::registry::domain::{AgentId, ManifestPatch, ManifestRecord};
use crate::registry::ports::{ManifestRepository, ManifestStoreError, StoreResult};

/// Thread-safe in-memory manifest store.
///
/// Keeps an insertion sequence per record so result ordering matches the
/// durable store: newest `created_at` first, ties broken by later
/// insertion first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManifestStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<AgentId, StoredRecord>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    seq: u64,
    record: ManifestRecord,
}

impl InMemoryManifestStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| ManifestStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| ManifestStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl ManifestRepository for InMemoryManifestStore {
    async fn insert(&self, record: &ManifestRecord) -> StoreResult<()> {
        let mut state = self.write_state()?;

        if state.records.contains_key(&record.id()) {
            return Err(ManifestStoreError::DuplicateId(record.id()));
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.records.insert(
            record.id(),
            StoredRecord {
                seq,
                record: record.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: AgentId) -> StoreResult<Option<ManifestRecord>> {
        let state = self.read_state()?;
        Ok(state.records.get(&id).map(|stored| stored.record.clone()))
    }

    async fn update(&self, id: AgentId, patch: &ManifestPatch) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        match state.records.get_mut(&id) {
            Some(stored) => {
                stored.record.apply_patch(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: AgentId) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        Ok(state.records.remove(&id).is_some())
    }

    async fn touch_heartbeat(&self, id: AgentId, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.write_state()?;
        match state.records.get_mut(&id) {
            Some(stored) => {
                stored.record.record_heartbeat(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(
        &self,
        query: &DiscoveryQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ManifestRecord>> {
        let state = self.read_state()?;
        let mut matching: Vec<&StoredRecord> = state
            .records
            .values()
            .filter(|stored| query.matches(&stored.record, now))
            .collect();
        matching.sort_by(|a, b| {
            b.record
                .created_at()
                .cmp(&a.record.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        Ok(matching
            .into_iter()
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn count(&self) -> StoreResult<u64> {
        let state = self.read_state()?;
        Ok(u64::try_from(state.records.len()).unwrap_or(u64::MAX))
    }
}
