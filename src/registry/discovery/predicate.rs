//! Independent filter predicates over manifest records.

use chrono::{DateTime, Utc};

use crate::registry::domain::{CapabilityFlag, ManifestRecord};

/// One independent discovery filter, evaluable against a single record.
///
/// A query compiles to a sequence of predicates combined with logical AND;
/// each predicate can be tested on its own, and new filters slot in
/// without touching existing ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Some skill in the manifest has exactly this id.
    SkillId(String),
    /// The manifest name contains this text, case-insensitively.
    NameContains(String),
    /// The record's owner tag equals this value exactly.
    OwnerEquals(String),
    /// The named capability flag is declared and enabled.
    Capability(CapabilityFlag),
    /// The latest heartbeat is at or after this cutoff instant.
    HeartbeatAtOrAfter(DateTime<Utc>),
}

impl Predicate {
    /// Returns whether the record satisfies this predicate.
    #[must_use]
    pub fn matches(&self, record: &ManifestRecord) -> bool {
        match self {
            Self::SkillId(skill_id) => record.manifest().has_skill(skill_id),
            Self::NameContains(needle) => record
                .manifest()
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::OwnerEquals(owner) => record.owner() == Some(owner.as_str()),
            Self::Capability(flag) => record.manifest().capabilities.flag(*flag),
            Self::HeartbeatAtOrAfter(cutoff) => record.last_heartbeat() >= *cutoff,
        }
    }
}
