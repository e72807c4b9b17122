//! Discovery query composition.

use chrono::{DateTime, Utc};

use super::liveness::liveness_cutoff;
use super::predicate::Predicate;
use crate::registry::domain::{CapabilityFlag, ManifestRecord};

/// A discovery query: every supplied filter must hold for a record to
/// match (AND semantics), and an empty query matches every record.
///
/// Results are always ordered most recently registered first; ordering and
/// execution live with the store adapters, which push the indexable
/// filters down to their backend.
///
/// # Examples
///
/// ```
/// use pharos::registry::discovery::DiscoveryQuery;
/// use pharos::registry::domain::CapabilityFlag;
///
/// let query = DiscoveryQuery::new()
///     .with_skill("currency-conversion")
///     .with_capability(CapabilityFlag::Streaming)
///     .with_only_alive();
/// assert!(!query.is_unfiltered());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryQuery {
    skill: Option<String>,
    name: Option<String>,
    owner: Option<String>,
    capabilities: Vec<CapabilityFlag>,
    only_alive: bool,
}

impl DiscoveryQuery {
    /// Creates an empty query matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a skill with exactly this id.
    #[must_use]
    pub fn with_skill(mut self, skill_id: impl Into<String>) -> Self {
        self.skill = Some(skill_id.into());
        self
    }

    /// Requires the manifest name to contain this text, case-insensitively.
    #[must_use]
    pub fn with_name(mut self, fragment: impl Into<String>) -> Self {
        self.name = Some(fragment.into());
        self
    }

    /// Requires the owner tag to equal this value exactly.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Requires a capability flag to be declared and enabled. Duplicate
    /// flags collapse to one filter.
    #[must_use]
    pub fn with_capability(mut self, flag: CapabilityFlag) -> Self {
        if !self.capabilities.contains(&flag) {
            self.capabilities.push(flag);
        }
        self
    }

    /// Requires the latest heartbeat to fall within the liveness window.
    #[must_use]
    pub const fn with_only_alive(mut self) -> Self {
        self.only_alive = true;
        self
    }

    /// Returns the skill id filter.
    #[must_use]
    pub fn skill(&self) -> Option<&str> {
        self.skill.as_deref()
    }

    /// Returns the name fragment filter.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the owner filter.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the required capability flags.
    #[must_use]
    pub fn capabilities(&self) -> &[CapabilityFlag] {
        &self.capabilities
    }

    /// Returns whether only alive records are requested.
    #[must_use]
    pub const fn only_alive(&self) -> bool {
        self.only_alive
    }

    /// Returns whether the query carries no filters at all.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.skill.is_none()
            && self.name.is_none()
            && self.owner.is_none()
            && self.capabilities.is_empty()
            && !self.only_alive
    }

    /// Compiles the query into its predicate sequence.
    ///
    /// The liveness predicate is anchored to the single `now` supplied by
    /// the caller, so one scan evaluates every record against the same
    /// cutoff.
    #[must_use]
    pub fn predicates(&self, now: DateTime<Utc>) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(skill_id) = &self.skill {
            predicates.push(Predicate::SkillId(skill_id.clone()));
        }
        if let Some(fragment) = &self.name {
            predicates.push(Predicate::NameContains(fragment.clone()));
        }
        if let Some(owner) = &self.owner {
            predicates.push(Predicate::OwnerEquals(owner.clone()));
        }
        for flag in &self.capabilities {
            predicates.push(Predicate::Capability(*flag));
        }
        if self.only_alive {
            predicates.push(Predicate::HeartbeatAtOrAfter(liveness_cutoff(now)));
        }
        predicates
    }

    /// Returns whether a record satisfies every filter in the query.
    #[must_use]
    pub fn matches(&self, record: &ManifestRecord, now: DateTime<Utc>) -> bool {
        self.predicates(now)
            .iter()
            .all(|predicate| predicate.matches(record))
    }
}
