//! Diesel row models for manifest record persistence.

use diesel::prelude::*;

use super::schema::manifest_records;

/// Query result row for manifest records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = manifest_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ManifestRow {
    /// Insertion sequence.
    pub seq: i64,
    /// Agent identifier as UUID text.
    pub id: String,
    /// Manifest document JSON.
    pub manifest: String,
    /// Owner tag.
    pub owner: Option<String>,
    /// Creation timestamp, epoch microseconds.
    pub created_at: i64,
    /// Latest heartbeat, epoch microseconds.
    pub last_heartbeat: i64,
    /// Projected manifest name.
    pub name: String,
    /// Projected capabilities JSON.
    pub capabilities: String,
    /// Projected streaming flag.
    pub cap_streaming: bool,
    /// Projected push notification flag.
    pub cap_push_notifications: bool,
    /// Projected state transition history flag.
    pub cap_state_transition_history: bool,
}

/// Insert model for manifest records. The insertion sequence is assigned
/// by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = manifest_records)]
pub struct NewManifestRow {
    /// Agent identifier as UUID text.
    pub id: String,
    /// Manifest document JSON.
    pub manifest: String,
    /// Owner tag.
    pub owner: Option<String>,
    /// Creation timestamp, epoch microseconds.
    pub created_at: i64,
    /// Latest heartbeat, epoch microseconds.
    pub last_heartbeat: i64,
    /// Projected manifest name.
    pub name: String,
    /// Projected capabilities JSON.
    pub capabilities: String,
    /// Projected streaming flag.
    pub cap_streaming: bool,
    /// Projected push notification flag.
    pub cap_push_notifications: bool,
    /// Projected state transition history flag.
    pub cap_state_transition_history: bool,
}

/// Update model rewriting the manifest and its projections together, so
/// the derived columns can never drift from the document.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = manifest_records)]
pub struct ManifestContentChangeset {
    /// Manifest document JSON.
    pub manifest: String,
    /// Projected manifest name.
    pub name: String,
    /// Projected capabilities JSON.
    pub capabilities: String,
    /// Projected streaming flag.
    pub cap_streaming: bool,
    /// Projected push notification flag.
    pub cap_push_notifications: bool,
    /// Projected state transition history flag.
    pub cap_state_transition_history: bool,
}
