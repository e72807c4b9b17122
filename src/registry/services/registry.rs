//! Orchestration service for the agent registry.
//!
//! Coordinates structural validation, persistence, and discovery behind
//! the registry's six operations. The service holds no state of its own
//! beyond wiring: repository, validator, clock, and the acceptance policy.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::registry::discovery::DiscoveryQuery;
use crate::registry::domain::{AgentId, AgentManifest, ManifestPatch, ManifestRecord};
use crate::registry::ports::{ManifestRepository, ManifestStoreError};
use crate::registry::validation::{ManifestValidator, ValidationReport};

/// How strictly register accepts candidates that fail full validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceptancePolicy {
    /// Only candidates passing full schema validation are accepted.
    #[default]
    Strict,
    /// A candidate failing full validation is still accepted when all
    /// required root fields are structurally present. The weaker guarantee
    /// is the caller's choice.
    RequiredFieldsFallback,
}

/// Service-level errors for registry operations.
///
/// Validation failures, unknown ids, unparseable input, and storage
/// failures are distinct variants so callers can map them to distinct
/// responses. Every failure path returns an explicit value; nothing is
/// swallowed or retried.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The candidate manifest failed structural validation. Nothing was
    /// persisted.
    #[error("{0}")]
    Validation(ValidationReport),

    /// The referenced agent does not exist.
    #[error("agent not found: {0}")]
    NotFound(AgentId),

    /// The request body was not parseable as the expected document shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] ManifestStoreError),
}

/// Result type for registry service operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Agent registration and discovery orchestration service.
#[derive(Clone)]
pub struct RegistryService<R, C>
where
    R: ManifestRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    validator: Arc<ManifestValidator>,
    clock: Arc<C>,
    policy: AcceptancePolicy,
}

impl<R, C> RegistryService<R, C>
where
    R: ManifestRepository,
    C: Clock + Send + Sync,
{
    /// Creates a service with the strict acceptance policy.
    #[must_use]
    pub fn new(repository: Arc<R>, validator: Arc<ManifestValidator>, clock: Arc<C>) -> Self {
        Self {
            repository,
            validator,
            clock,
            policy: AcceptancePolicy::Strict,
        }
    }

    /// Overrides the acceptance policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Registers a candidate manifest.
    ///
    /// The candidate is validated before anything touches the store; a
    /// failing candidate is never partially persisted. On success the
    /// freshly stored record (id assigned, both timestamps stamped) is
    /// returned and immediately visible to a subsequent get.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] with the full violation list
    /// when the candidate fails the acceptance policy,
    /// [`RegistryError::MalformedInput`] when the accepted document cannot
    /// be materialised, or [`RegistryError::Store`] on persistence failure.
    pub async fn register(
        &self,
        candidate: &Value,
        owner: Option<String>,
    ) -> RegistryResult<ManifestRecord> {
        let report = self.validator.validate(candidate);
        if !report.is_empty() {
            let accept_anyway = self.policy == AcceptancePolicy::RequiredFieldsFallback
                && self.validator.check_required_only(candidate).is_empty();
            if !accept_anyway {
                return Err(RegistryError::Validation(report));
            }
        }

        let manifest: AgentManifest = serde_json::from_value(candidate.clone())
            .map_err(|err| RegistryError::MalformedInput(err.to_string()))?;

        let record = ManifestRecord::new(manifest, owner, &*self.clock);
        self.repository.insert(&record).await?;
        Ok(record)
    }

    /// Retrieves a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown, or
    /// [`RegistryError::Store`] on persistence failure.
    pub async fn get(&self, id: AgentId) -> RegistryResult<ManifestRecord> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(id))
    }

    /// Lists records matching the query, most recently registered first.
    ///
    /// A single `now` is captured here and anchors every liveness
    /// evaluation in the scan.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] on persistence failure.
    pub async fn list(&self, query: &DiscoveryQuery) -> RegistryResult<Vec<ManifestRecord>> {
        let now = self.now();
        Ok(self.repository.find(query, now).await?)
    }

    /// Advances the record's heartbeat and returns the updated record.
    ///
    /// Heartbeats touch liveness only; manifest content and the remaining
    /// metadata are untouched. Repeated touches within the liveness window
    /// are idempotent apart from the advancing timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown, or
    /// [`RegistryError::Store`] on persistence failure.
    pub async fn heartbeat(&self, id: AgentId) -> RegistryResult<ManifestRecord> {
        let now = self.now();
        let touched = self.repository.touch_heartbeat(id, now).await?;
        if !touched {
            return Err(RegistryError::NotFound(id));
        }
        self.get(id).await
    }

    /// Merges a partial manifest update and returns the updated record.
    ///
    /// The patch is a typed field set, so replaced values are structurally
    /// sound by construction; full schema validation is deliberately not
    /// re-run here to keep partial edits cheap. Metadata (id, owner,
    /// timestamps) is never mutated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown, or
    /// [`RegistryError::Store`] on persistence failure.
    pub async fn update(
        &self,
        id: AgentId,
        patch: &ManifestPatch,
    ) -> RegistryResult<ManifestRecord> {
        let applied = self.repository.update(id, patch).await?;
        if !applied {
            return Err(RegistryError::NotFound(id));
        }
        self.get(id).await
    }

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the id is unknown, or
    /// [`RegistryError::Store`] on persistence failure.
    pub async fn delete(&self, id: AgentId) -> RegistryResult<()> {
        let removed = self.repository.delete(id).await?;
        if !removed {
            return Err(RegistryError::NotFound(id));
        }
        Ok(())
    }

    /// Returns the number of registered records.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] on persistence failure.
    pub async fn count(&self) -> RegistryResult<u64> {
        Ok(self.repository.count().await?)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}
