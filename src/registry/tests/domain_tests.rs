//! Unit tests for manifest, record, and capability domain types.

use std::str::FromStr;

use chrono::TimeDelta;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;

use crate::registry::domain::{
    AgentId, AgentManifest, CapabilityFlag, ManifestCapabilities, ManifestPatch, ManifestRecord,
};

use super::sample_manifest_json;

fn sample_manifest(name: &str, skill_id: &str) -> AgentManifest {
    serde_json::from_value(sample_manifest_json(name, skill_id))
        .expect("sample document should deserialise")
}

#[rstest]
fn manifest_round_trips_through_wire_format() {
    let manifest = sample_manifest("translator", "translate");

    let encoded = serde_json::to_value(&manifest).expect("manifest should serialise");
    let decoded: AgentManifest =
        serde_json::from_value(encoded.clone()).expect("manifest should deserialise");

    assert_eq!(decoded, manifest);
    // Wire names stay camelCase and absent optionals are omitted entirely.
    assert!(encoded.get("protocolVersion").is_some());
    assert!(encoded.get("protocol_version").is_none());
    assert!(encoded.get("documentationUrl").is_none());
}

#[rstest]
fn manifest_reports_declared_skills() {
    let manifest = sample_manifest("translator", "translate");

    assert!(manifest.has_skill("translate"));
    assert!(!manifest.has_skill("summarise"));
}

#[rstest]
#[case("streaming", CapabilityFlag::Streaming)]
#[case("pushNotifications", CapabilityFlag::PushNotifications)]
#[case("push_notifications", CapabilityFlag::PushNotifications)]
#[case("stateTransitionHistory", CapabilityFlag::StateTransitionHistory)]
#[case("state_transition_history", CapabilityFlag::StateTransitionHistory)]
fn capability_flags_accept_both_spellings(#[case] raw: &str, #[case] expected: CapabilityFlag) {
    let parsed = CapabilityFlag::from_str(raw).expect("spelling should be recognised");

    assert_eq!(parsed, expected);
}

#[rstest]
fn capability_flag_list_skips_blanks_and_rejects_unknown_names() {
    let flags = CapabilityFlag::parse_list("streaming, ,push_notifications")
        .expect("known names should parse");
    assert_eq!(
        flags,
        vec![CapabilityFlag::Streaming, CapabilityFlag::PushNotifications]
    );

    assert!(CapabilityFlag::parse_list("streaming,telepathy").is_err());
}

#[rstest]
fn capability_document_parses_snake_case_aliases() {
    let capabilities: ManifestCapabilities = serde_json::from_value(json!({
        "streaming": true,
        "push_notifications": true
    }))
    .expect("snake_case spellings should deserialise");

    assert!(capabilities.flag(CapabilityFlag::Streaming));
    assert!(capabilities.flag(CapabilityFlag::PushNotifications));
    // Undeclared flags read as disabled.
    assert!(!capabilities.flag(CapabilityFlag::StateTransitionHistory));
}

#[rstest]
fn new_record_stamps_creation_and_heartbeat_together() {
    let record = ManifestRecord::new(sample_manifest("translator", "translate"), None, &DefaultClock);

    assert_eq!(record.created_at(), record.last_heartbeat());
    assert!(record.owner().is_none());
}

#[rstest]
fn heartbeat_never_moves_backwards() {
    let mut record =
        ManifestRecord::new(sample_manifest("translator", "translate"), None, &DefaultClock);
    let created = record.created_at();

    let later = created + TimeDelta::seconds(30);
    record.record_heartbeat(later);
    assert_eq!(record.last_heartbeat(), later);

    record.record_heartbeat(created + TimeDelta::seconds(10));
    assert_eq!(record.last_heartbeat(), later, "stale timestamp must be ignored");

    assert_eq!(record.created_at(), created, "creation time is immutable");
}

#[rstest]
fn patch_replaces_only_named_fields() {
    let mut record = ManifestRecord::new(
        sample_manifest("translator", "translate"),
        Some("root".to_owned()),
        &DefaultClock,
    );
    let original = record.manifest().clone();

    let patch = ManifestPatch {
        description: Some("Updated description".to_owned()),
        ..ManifestPatch::default()
    };
    record.apply_patch(&patch);

    let updated = record.manifest();
    assert_eq!(updated.description, "Updated description");
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.url, original.url);
    assert_eq!(updated.skills, original.skills);
    assert_eq!(updated.version, original.version);
}

#[rstest]
fn empty_patch_detection() {
    assert!(ManifestPatch::default().is_empty());
    assert!(!ManifestPatch {
        url: Some("http://example.invalid/".to_owned()),
        ..ManifestPatch::default()
    }
    .is_empty());
}

#[rstest]
fn patch_accepts_both_protocol_version_spellings() {
    let camel: ManifestPatch = serde_json::from_value(json!({ "protocolVersion": "0.4.0" }))
        .expect("camelCase spelling should deserialise");
    let snake: ManifestPatch = serde_json::from_value(json!({ "protocol_version": "0.4.0" }))
        .expect("snake_case spelling should deserialise");

    assert_eq!(camel.protocol_version.as_deref(), Some("0.4.0"));
    assert_eq!(camel, snake);
}

#[rstest]
fn agent_ids_round_trip_as_strings() {
    let id = AgentId::new();
    let parsed = AgentId::from_str(&id.to_string()).expect("displayed id should parse");

    assert_eq!(parsed, id);
    assert!(AgentId::from_str("not-a-uuid").is_err());
}

#[rstest]
fn fresh_agent_ids_are_distinct() {
    assert_ne!(AgentId::new(), AgentId::new());
}

#[rstest]
fn timestamps_survive_microsecond_storage_precision() {
    // Persistence stores timestamps as epoch microseconds, so a value
    // already at microsecond precision must round-trip exactly.
    let stamp = chrono::DateTime::from_timestamp_micros(1_725_000_000_123_456)
        .expect("fixed instant should be representable");

    let restored = chrono::DateTime::from_timestamp_micros(stamp.timestamp_micros())
        .expect("stored instant should be representable");

    assert_eq!(restored, stamp);
}
