//! SQLite store implementation for manifest records.
//!
//! Two lifecycles are supported: a durable file-backed database behind an
//! r2d2 connection pool, and an ephemeral in-memory database that holds
//! one connection for the lifetime of the store instance; an in-memory
//! SQLite database is destroyed the moment its last connection closes, so
//! pooling would silently lose data between calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use super::models::{ManifestContentChangeset, ManifestRow, NewManifestRow};
use super::schema::{manifest_records, CREATE_SCHEMA_SQL};
use crate::registry::discovery::{liveness_cutoff, DiscoveryQuery, Predicate};
use crate::registry::domain::{
    AgentId, AgentManifest, CapabilityFlag, ManifestPatch, ManifestRecord, PersistedRecordData,
};
use crate::registry::ports::{ManifestRepository, ManifestStoreError, StoreResult};

/// Storage lifecycle for [`SqliteManifestStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// Durable database at the given path; survives process restarts.
    File(PathBuf),
    /// In-memory database scoped to the store instance. Used by tests.
    Ephemeral,
}

impl StorageMode {
    /// Convenience constructor for the file mode.
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

/// Connection pool type used by the file-backed mode.
type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
enum ConnectionSource {
    Pooled(SqlitePool),
    Ephemeral(Arc<Mutex<SqliteConnection>>),
}

/// SQLite-backed manifest store.
#[derive(Clone)]
pub struct SqliteManifestStore {
    source: ConnectionSource,
}

/// Applies session pragmas to every pooled connection.
#[derive(Debug, Clone, Copy)]
struct SessionPragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SessionPragmas {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(
                "PRAGMA journal_mode = WAL; \
                 PRAGMA synchronous = NORMAL; \
                 PRAGMA busy_timeout = 5000; \
                 PRAGMA foreign_keys = ON;",
            )
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

impl SqliteManifestStore {
    /// Opens a store in the given mode and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestStoreError::Persistence`] when the database cannot
    /// be opened or the schema cannot be created.
    pub fn open(mode: &StorageMode) -> StoreResult<Self> {
        match mode {
            StorageMode::File(path) => {
                let manager =
                    ConnectionManager::<SqliteConnection>::new(path.to_string_lossy().as_ref());
                let pool = Pool::builder()
                    .connection_customizer(Box::new(SessionPragmas))
                    .build(manager)
                    .map_err(ManifestStoreError::persistence)?;
                {
                    let mut connection =
                        pool.get().map_err(ManifestStoreError::persistence)?;
                    connection
                        .batch_execute(CREATE_SCHEMA_SQL)
                        .map_err(ManifestStoreError::persistence)?;
                }
                Ok(Self {
                    source: ConnectionSource::Pooled(pool),
                })
            }
            StorageMode::Ephemeral => {
                let mut connection = SqliteConnection::establish(":memory:")
                    .map_err(ManifestStoreError::persistence)?;
                connection
                    .batch_execute(CREATE_SCHEMA_SQL)
                    .map_err(ManifestStoreError::persistence)?;
                Ok(Self {
                    source: ConnectionSource::Ephemeral(Arc::new(Mutex::new(connection))),
                })
            }
        }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || match source {
            ConnectionSource::Pooled(pool) => {
                let mut connection = pool.get().map_err(ManifestStoreError::persistence)?;
                f(&mut connection)
            }
            ConnectionSource::Ephemeral(shared) => {
                let mut connection = shared.lock().map_err(|err| {
                    ManifestStoreError::persistence(std::io::Error::other(err.to_string()))
                })?;
                f(&mut connection)
            }
        })
        .await
        .map_err(ManifestStoreError::persistence)?
    }
}

impl From<DieselError> for ManifestStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ManifestRepository for SqliteManifestStore {
    async fn insert(&self, record: &ManifestRecord) -> StoreResult<()> {
        let agent_id = record.id();
        let new_row = to_new_row(record)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(manifest_records::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ManifestStoreError::DuplicateId(agent_id)
                    }
                    other => ManifestStoreError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: AgentId) -> StoreResult<Option<ManifestRecord>> {
        let id_text = id.to_string();
        self.run_blocking(move |connection| {
            let row = manifest_records::table
                .filter(manifest_records::id.eq(&id_text))
                .select(ManifestRow::as_select())
                .first::<ManifestRow>(connection)
                .optional()
                .map_err(ManifestStoreError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn update(&self, id: AgentId, patch: &ManifestPatch) -> StoreResult<bool> {
        let id_text = id.to_string();
        let content_patch = patch.clone();

        self.run_blocking(move |connection| {
            connection.transaction::<bool, ManifestStoreError, _>(|txn| {
                let stored = manifest_records::table
                    .filter(manifest_records::id.eq(&id_text))
                    .select(manifest_records::manifest)
                    .first::<String>(txn)
                    .optional()
                    .map_err(ManifestStoreError::persistence)?;

                let Some(manifest_json) = stored else {
                    return Ok(false);
                };

                let mut manifest: AgentManifest = serde_json::from_str(&manifest_json)
                    .map_err(ManifestStoreError::invalid_persisted_data)?;
                manifest.apply(&content_patch);

                let changeset = to_content_changeset(&manifest)?;
                diesel::update(
                    manifest_records::table.filter(manifest_records::id.eq(&id_text)),
                )
                .set(&changeset)
                .execute(txn)
                .map_err(ManifestStoreError::persistence)?;
                Ok(true)
            })
        })
        .await
    }

    async fn delete(&self, id: AgentId) -> StoreResult<bool> {
        let id_text = id.to_string();
        self.run_blocking(move |connection| {
            let removed =
                diesel::delete(manifest_records::table.filter(manifest_records::id.eq(&id_text)))
                    .execute(connection)
                    .map_err(ManifestStoreError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn touch_heartbeat(&self, id: AgentId, now: DateTime<Utc>) -> StoreResult<bool> {
        let id_text = id.to_string();
        let now_micros = now.timestamp_micros();

        self.run_blocking(move |connection| {
            // One atomic statement; MAX keeps the timestamp monotonic even
            // if a lagging clock value races a fresher one.
            let touched =
                diesel::update(manifest_records::table.filter(manifest_records::id.eq(&id_text)))
                    .set(manifest_records::last_heartbeat.eq(diesel::dsl::sql::<BigInt>(
                        "MAX(last_heartbeat, ",
                    )
                    .bind::<BigInt, _>(now_micros)
                    .sql(")")))
                    .execute(connection)
                    .map_err(ManifestStoreError::persistence)?;
            Ok(touched > 0)
        })
        .await
    }

    async fn find(
        &self,
        query: &DiscoveryQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<ManifestRecord>> {
        let filters = query.clone();
        self.run_blocking(move |connection| {
            let mut sql = manifest_records::table
                .select(ManifestRow::as_select())
                .into_boxed();

            if let Some(owner) = filters.owner() {
                sql = sql.filter(manifest_records::owner.eq(owner.to_owned()));
            }
            for flag in filters.capabilities() {
                sql = match flag {
                    CapabilityFlag::Streaming => {
                        sql.filter(manifest_records::cap_streaming.eq(true))
                    }
                    CapabilityFlag::PushNotifications => {
                        sql.filter(manifest_records::cap_push_notifications.eq(true))
                    }
                    CapabilityFlag::StateTransitionHistory => {
                        sql.filter(manifest_records::cap_state_transition_history.eq(true))
                    }
                };
            }
            if filters.only_alive() {
                let cutoff_micros = liveness_cutoff(now).timestamp_micros();
                sql = sql.filter(manifest_records::last_heartbeat.ge(cutoff_micros));
            }

            let rows = sql
                .order((
                    manifest_records::created_at.desc(),
                    manifest_records::seq.desc(),
                ))
                .load::<ManifestRow>(connection)
                .map_err(ManifestStoreError::persistence)?;

            // Skill membership walks the document, and name matching needs
            // full Unicode case folding with `%` and `_` taken literally,
            // which SQLite's LIKE does not give. Both filter the
            // already-narrowed rows instead of the SQL projection columns.
            let mut post_filters = Vec::new();
            if let Some(skill_id) = filters.skill() {
                post_filters.push(Predicate::SkillId(skill_id.to_owned()));
            }
            if let Some(fragment) = filters.name() {
                post_filters.push(Predicate::NameContains(fragment.to_owned()));
            }

            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let record = row_to_record(row)?;
                if post_filters.iter().all(|predicate| predicate.matches(&record)) {
                    records.push(record);
                }
            }
            Ok(records)
        })
        .await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.run_blocking(|connection| {
            let total = manifest_records::table
                .count()
                .get_result::<i64>(connection)
                .map_err(ManifestStoreError::persistence)?;
            u64::try_from(total).map_err(ManifestStoreError::persistence)
        })
        .await
    }
}

/// Recomputed projection columns plus the document itself.
fn to_content_changeset(manifest: &AgentManifest) -> StoreResult<ManifestContentChangeset> {
    let manifest_json =
        serde_json::to_string(manifest).map_err(ManifestStoreError::persistence)?;
    let capabilities_json = serde_json::to_string(&manifest.capabilities)
        .map_err(ManifestStoreError::persistence)?;
    Ok(ManifestContentChangeset {
        manifest: manifest_json,
        name: manifest.name.clone(),
        capabilities: capabilities_json,
        cap_streaming: manifest.capabilities.flag(CapabilityFlag::Streaming),
        cap_push_notifications: manifest.capabilities.flag(CapabilityFlag::PushNotifications),
        cap_state_transition_history: manifest
            .capabilities
            .flag(CapabilityFlag::StateTransitionHistory),
    })
}

fn to_new_row(record: &ManifestRecord) -> StoreResult<NewManifestRow> {
    let content = to_content_changeset(record.manifest())?;
    Ok(NewManifestRow {
        id: record.id().to_string(),
        manifest: content.manifest,
        owner: record.owner().map(str::to_owned),
        created_at: record.created_at().timestamp_micros(),
        last_heartbeat: record.last_heartbeat().timestamp_micros(),
        name: content.name,
        capabilities: content.capabilities,
        cap_streaming: content.cap_streaming,
        cap_push_notifications: content.cap_push_notifications,
        cap_state_transition_history: content.cap_state_transition_history,
    })
}

fn row_to_record(row: ManifestRow) -> StoreResult<ManifestRecord> {
    let parsed_id =
        AgentId::from_str(&row.id).map_err(ManifestStoreError::invalid_persisted_data)?;
    let manifest: AgentManifest = serde_json::from_str(&row.manifest)
        .map_err(ManifestStoreError::invalid_persisted_data)?;
    let created_at = micros_to_datetime(row.created_at)?;
    let last_heartbeat = micros_to_datetime(row.last_heartbeat)?;

    Ok(ManifestRecord::from_persisted(PersistedRecordData {
        id: parsed_id,
        manifest,
        owner: row.owner,
        created_at,
        last_heartbeat,
    }))
}

fn micros_to_datetime(micros: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| {
        ManifestStoreError::invalid_persisted_data(std::io::Error::other(format!(
            "timestamp out of range: {micros}"
        )))
    })
}
