//! Diesel schema for manifest record persistence.
//!
//! `name`, `capabilities`, and the capability flag columns are projections
//! of the manifest document, recomputed on every write so filters never
//! need a full document scan. Timestamps are stored as microseconds since
//! the Unix epoch, which keeps range comparisons and ordering exact.

diesel::table! {
    /// Registered agent manifest records.
    manifest_records (seq) {
        /// Insertion sequence, used as the ordering tie-breaker.
        seq -> BigInt,
        /// Registry-assigned agent identifier (UUID text).
        id -> Text,
        /// Manifest document as JSON text.
        manifest -> Text,
        /// Optional owner tag, informational only.
        owner -> Nullable<Text>,
        /// Creation timestamp, microseconds since the Unix epoch.
        created_at -> BigInt,
        /// Latest heartbeat timestamp, microseconds since the Unix epoch.
        last_heartbeat -> BigInt,
        /// Projection of `manifest.name` for indexed lookup.
        name -> Text,
        /// Projection of `manifest.capabilities` as JSON text.
        capabilities -> Text,
        /// Projection: streaming capability enabled.
        cap_streaming -> Bool,
        /// Projection: push notification capability enabled.
        cap_push_notifications -> Bool,
        /// Projection: state transition history capability enabled.
        cap_state_transition_history -> Bool,
    }
}

/// DDL applied at store construction.
pub const CREATE_SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS manifest_records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    manifest TEXT NOT NULL,
    owner TEXT,
    created_at INTEGER NOT NULL,
    last_heartbeat INTEGER NOT NULL,
    name TEXT NOT NULL,
    capabilities TEXT NOT NULL,
    cap_streaming BOOLEAN NOT NULL DEFAULT 0,
    cap_push_notifications BOOLEAN NOT NULL DEFAULT 0,
    cap_state_transition_history BOOLEAN NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_manifest_records_owner ON manifest_records(owner);
CREATE INDEX IF NOT EXISTS idx_manifest_records_name ON manifest_records(name);
CREATE INDEX IF NOT EXISTS idx_manifest_records_last_heartbeat ON manifest_records(last_heartbeat);
CREATE INDEX IF NOT EXISTS idx_manifest_records_capabilities ON manifest_records(cap_streaming, cap_push_notifications, cap_state_transition_history);
";
