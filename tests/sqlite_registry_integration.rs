//! Behavioural integration tests for the `SQLite` manifest store.
//!
//! These run the registry lifecycle against real `SQLite` databases in
//! both storage modes: a shared ephemeral in-memory connection and a
//! durable on-disk file that is closed and reopened to prove persistence.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use serde_json::{json, Value};

use pharos::registry::adapters::sqlite::{SqliteManifestStore, StorageMode};
use pharos::registry::discovery::DiscoveryQuery;
use pharos::registry::domain::{CapabilityFlag, ManifestPatch, ManifestRecord};
use pharos::registry::ports::{ManifestRepository, ManifestStoreError};
use pharos::registry::services::RegistryService;
use pharos::registry::validation::ManifestValidator;

type SqliteService = RegistryService<SqliteManifestStore, DefaultClock>;

fn manifest(name: &str, skill_id: &str, capabilities: Value) -> Value {
    json!({
        "name": name,
        "description": "An agent under test",
        "version": "1.0.0",
        "protocolVersion": "0.3.0",
        "url": format!("http://localhost:9000/{skill_id}"),
        "capabilities": capabilities,
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "skills": [
            {
                "id": skill_id,
                "name": "Primary skill",
                "description": "Does the thing the agent is named after",
                "tags": ["test"]
            }
        ]
    })
}

fn service_over(store: Arc<SqliteManifestStore>) -> SqliteService {
    RegistryService::new(
        store,
        Arc::new(ManifestValidator::with_embedded_schema().expect("embedded schema should load")),
        Arc::new(DefaultClock),
    )
}

fn ephemeral_store() -> Arc<SqliteManifestStore> {
    Arc::new(SqliteManifestStore::open(&StorageMode::Ephemeral).expect("store should open"))
}

#[tokio::test(flavor = "multi_thread")]
async fn ephemeral_store_supports_the_full_lifecycle() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    let translator = service
        .register(
            &manifest("Translator", "translate", json!({ "streaming": true })),
            Some("alice".to_owned()),
        )
        .await
        .expect("registration should succeed");
    service
        .register(
            &manifest("Summariser", "summarise", json!({ "streaming": false })),
            None,
        )
        .await
        .expect("registration should succeed");

    // Round trip: the persisted row reconstructs the exact record.
    let fetched = service
        .get(translator.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(fetched, translator);

    // Capability filtering is pushed down to the projected flag columns.
    let streaming = service
        .list(&DiscoveryQuery::new().with_capability(CapabilityFlag::Streaming))
        .await
        .expect("listing should succeed");
    assert_eq!(streaming.len(), 1);
    assert_eq!(streaming.first().map(ManifestRecord::id), Some(translator.id()));

    // Skill filtering inspects manifest content rather than the projection.
    let translators = service
        .list(&DiscoveryQuery::new().with_skill("translate"))
        .await
        .expect("listing should succeed");
    assert_eq!(translators.len(), 1);

    // Name filtering is a case-insensitive substring match.
    let by_name = service
        .list(&DiscoveryQuery::new().with_name("SUMMAR"))
        .await
        .expect("listing should succeed");
    assert_eq!(by_name.len(), 1);

    service
        .delete(translator.id())
        .await
        .expect("delete should succeed");
    assert_eq!(service.count().await.expect("count should succeed"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn updates_rewrite_projection_columns() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    let agent = service
        .register(&manifest("Translator", "translate", json!({})), None)
        .await
        .expect("registration should succeed");

    let patch = ManifestPatch {
        name: Some("Interpreter".to_owned()),
        capabilities: Some(
            serde_json::from_value(json!({ "streaming": true }))
                .expect("capability document should deserialise"),
        ),
        ..ManifestPatch::default()
    };
    service
        .update(agent.id(), &patch)
        .await
        .expect("update should succeed");

    // Both derived filters now see the patched values.
    let renamed = service
        .list(&DiscoveryQuery::new().with_name("interpreter"))
        .await
        .expect("listing should succeed");
    assert_eq!(renamed.len(), 1);

    let streaming = service
        .list(&DiscoveryQuery::new().with_capability(CapabilityFlag::Streaming))
        .await
        .expect("listing should succeed");
    assert_eq!(streaming.len(), 1);

    // Metadata is untouched by a content update.
    let updated = service
        .get(agent.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(updated.created_at(), agent.created_at());
    assert_eq!(updated.last_heartbeat(), agent.last_heartbeat());
}

#[tokio::test(flavor = "multi_thread")]
async fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("temporary directory should be created");
    let path = dir.path().join("registry.db");

    let agent = {
        let store =
            Arc::new(SqliteManifestStore::open(&StorageMode::file(&path)).expect("store should open"));
        let service = service_over(Arc::clone(&store));
        service
            .register(
                &manifest("Durable", "persist", json!({ "pushNotifications": true })),
                Some("carol".to_owned()),
            )
            .await
            .expect("registration should succeed")
    };

    // A fresh store over the same file sees the record with identical
    // content, metadata, and timestamps.
    let reopened =
        Arc::new(SqliteManifestStore::open(&StorageMode::file(&path)).expect("store should reopen"));
    let service = service_over(Arc::clone(&reopened));

    let fetched = service
        .get(agent.id())
        .await
        .expect("lookup should succeed");
    assert_eq!(fetched, agent);

    let flagged = service
        .list(&DiscoveryQuery::new().with_capability(CapabilityFlag::PushNotifications))
        .await
        .expect("listing should succeed");
    assert_eq!(flagged.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_identifiers_map_to_the_store_error() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    let agent = service
        .register(&manifest("Original", "first", json!({})), None)
        .await
        .expect("registration should succeed");
    let stored = store
        .get(agent.id())
        .await
        .expect("lookup should succeed")
        .expect("record should exist");

    let error = store
        .insert(&stored)
        .await
        .expect_err("second insert of the same id should fail");
    assert!(matches!(error, ManifestStoreError::DuplicateId(id) if id == agent.id()));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_heartbeats_keep_the_newest_instant() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    let agent = service
        .register(&manifest("Busy", "work", json!({})), None)
        .await
        .expect("registration should succeed");

    let base = chrono::DateTime::from_timestamp_micros(Utc::now().timestamp_micros())
        .expect("current time should be representable");
    let mut handles = Vec::new();
    for offset in 1..=8_i64 {
        let handle_store = Arc::clone(&store);
        let id = agent.id();
        handles.push(tokio::spawn(async move {
            handle_store
                .touch_heartbeat(id, base + TimeDelta::seconds(offset))
                .await
        }));
    }
    for handle in handles {
        assert!(handle
            .await
            .expect("task should complete")
            .expect("touch should succeed"));
    }

    let record = store
        .get(agent.id())
        .await
        .expect("lookup should succeed")
        .expect("record should exist");
    // The single-statement MAX() write makes interleavings commute.
    assert_eq!(
        record.last_heartbeat().timestamp_micros(),
        (base + TimeDelta::seconds(8)).timestamp_micros()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn name_filtering_treats_fragments_literally_and_folds_unicode_case() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    service
        .register(&manifest("Uptime 99% Monitor", "monitor", json!({})), None)
        .await
        .expect("registration should succeed");
    service
        .register(&manifest("Uptime 98x Monitor", "monitor", json!({})), None)
        .await
        .expect("registration should succeed");
    let archivist = service
        .register(&manifest("ÀRCHIVIST", "archive", json!({})), None)
        .await
        .expect("registration should succeed");

    // `%` in the fragment is a literal character, not a wildcard.
    let exact = service
        .list(&DiscoveryQuery::new().with_name("99%"))
        .await
        .expect("listing should succeed");
    assert_eq!(exact.len(), 1);
    assert_eq!(
        exact.first().map(|record| record.manifest().name.as_str()),
        Some("Uptime 99% Monitor")
    );

    // Case folding covers the full alphabet, matching the in-memory store.
    let accented = service
        .list(&DiscoveryQuery::new().with_name("àrchiv"))
        .await
        .expect("listing should succeed");
    assert_eq!(accented.len(), 1);
    assert_eq!(accented.first().map(ManifestRecord::id), Some(archivist.id()));
}

#[tokio::test(flavor = "multi_thread")]
async fn ordering_is_newest_registration_first() {
    let store = ephemeral_store();
    let service = service_over(Arc::clone(&store));

    let mut expected = Vec::new();
    for index in 0..5 {
        let record = service
            .register(&manifest(&format!("agent-{index}"), "skill", json!({})), None)
            .await
            .expect("registration should succeed");
        expected.push(record.id());
    }
    expected.reverse();

    let listed = service
        .list(&DiscoveryQuery::new())
        .await
        .expect("listing should succeed");
    let ids: Vec<_> = listed.iter().map(ManifestRecord::id).collect();
    assert_eq!(ids, expected);
}
