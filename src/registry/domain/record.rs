//! The stored pairing of a manifest with registry-owned metadata.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::manifest::{AgentManifest, ManifestPatch};
use super::AgentId;

/// A registered manifest together with the metadata the registry owns.
///
/// The registry exclusively owns a record for its lifetime. `created_at`
/// is stamped once at insertion and never mutated; `last_heartbeat` starts
/// equal to `created_at` and only moves forward. Records carry no implicit
/// expiry: staleness is a query-time filter, never a deletion trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    id: AgentId,
    manifest: AgentManifest,
    owner: Option<String>,
    created_at: DateTime<Utc>,
    last_heartbeat: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecordData {
    /// Persisted record identifier.
    pub id: AgentId,
    /// Persisted manifest document.
    pub manifest: AgentManifest,
    /// Persisted owner tag, informational only.
    pub owner: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest heartbeat timestamp.
    pub last_heartbeat: DateTime<Utc>,
}

impl ManifestRecord {
    /// Creates a new record with a fresh identifier.
    ///
    /// Both timestamps are stamped from the clock, so the record starts
    /// alive.
    #[must_use]
    pub fn new(manifest: AgentManifest, owner: Option<String>, clock: &impl Clock) -> Self {
        // Timestamps are held at microsecond precision, the same precision
        // they persist at, so a stored record reads back identical.
        let timestamp = truncate_to_micros(clock.utc());
        Self {
            id: AgentId::new(),
            manifest,
            owner,
            created_at: timestamp,
            last_heartbeat: timestamp,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRecordData) -> Self {
        Self {
            id: data.id,
            manifest: data.manifest,
            owner: data.owner,
            created_at: data.created_at,
            last_heartbeat: data.last_heartbeat,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Returns the stored manifest.
    #[must_use]
    pub const fn manifest(&self) -> &AgentManifest {
        &self.manifest
    }

    /// Returns the owner tag, if one was supplied at registration.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest heartbeat timestamp.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Advances the heartbeat timestamp.
    ///
    /// The timestamp never moves backwards; a `now` earlier than the stored
    /// heartbeat leaves the record unchanged.
    pub fn record_heartbeat(&mut self, now: DateTime<Utc>) {
        let instant = truncate_to_micros(now);
        if instant > self.last_heartbeat {
            self.last_heartbeat = instant;
        }
    }

    /// Merges a partial manifest update into the record.
    ///
    /// Only manifest content changes; id, owner, and both timestamps are
    /// untouched by construction.
    pub fn apply_patch(&mut self, patch: &ManifestPatch) {
        self.manifest.apply(patch);
    }
}

/// Drops sub-microsecond precision so in-process timestamps compare equal
/// to their persisted form.
fn truncate_to_micros(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(instant.timestamp_micros()).unwrap_or(instant)
}
