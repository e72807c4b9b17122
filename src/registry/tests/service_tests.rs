//! Unit tests for registry service orchestration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use mockall::mock;
use mockall::predicate::always;
use rstest::{fixture, rstest};
use serde_json::json;

use crate::registry::adapters::memory::InMemoryManifestStore;
use crate::registry::discovery::DiscoveryQuery;
use crate::registry::domain::{AgentId, ManifestPatch, ManifestRecord};
use crate::registry::ports::{ManifestRepository, ManifestStoreError, StoreResult};
use crate::registry::services::{AcceptancePolicy, RegistryError, RegistryService};
use crate::registry::validation::ManifestValidator;

use super::sample_manifest_json;

type TestService = RegistryService<InMemoryManifestStore, DefaultClock>;

mock! {
    Repository {}

    #[async_trait::async_trait]
    impl ManifestRepository for Repository {
        async fn insert(&self, record: &ManifestRecord) -> StoreResult<()>;
        async fn get(&self, id: AgentId) -> StoreResult<Option<ManifestRecord>>;
        async fn update(&self, id: AgentId, patch: &ManifestPatch) -> StoreResult<bool>;
        async fn delete(&self, id: AgentId) -> StoreResult<bool>;
        async fn touch_heartbeat(&self, id: AgentId, now: DateTime<Utc>) -> StoreResult<bool>;
        async fn find(
            &self,
            query: &DiscoveryQuery,
            now: DateTime<Utc>,
        ) -> StoreResult<Vec<ManifestRecord>>;
        async fn count(&self) -> StoreResult<u64>;
    }
}

#[fixture]
fn service() -> TestService {
    RegistryService::new(
        Arc::new(InMemoryManifestStore::new()),
        Arc::new(ManifestValidator::with_embedded_schema().expect("embedded schema should load")),
        Arc::new(DefaultClock),
    )
}

fn service_over(repository: MockRepository) -> RegistryService<MockRepository, DefaultClock> {
    RegistryService::new(
        Arc::new(repository),
        Arc::new(ManifestValidator::with_embedded_schema().expect("embedded schema should load")),
        Arc::new(DefaultClock),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registration_persists_and_is_immediately_visible(service: TestService) {
    let created = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect("registration should succeed");

    let fetched = service
        .get(created.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(fetched, created);
    assert_eq!(created.created_at(), created.last_heartbeat());
    assert_eq!(service.count().await.expect("count should succeed"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_tag_is_stored_verbatim(service: TestService) {
    let created = service
        .register(
            &sample_manifest_json("translator", "translate"),
            Some("root".to_owned()),
        )
        .await
        .expect("registration should succeed");

    assert_eq!(created.owner(), Some("root"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_manifest_is_rejected_and_nothing_is_stored(service: TestService) {
    let mut candidate = sample_manifest_json("translator", "translate");
    candidate
        .as_object_mut()
        .expect("sample is an object")
        .remove("skills");

    let error = service
        .register(&candidate, None)
        .await
        .expect_err("registration should fail");

    assert!(matches!(error, RegistryError::Validation(_)));
    assert_eq!(service.count().await.expect("count should succeed"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fallback_policy_accepts_nested_violations(service: TestService) {
    let mut candidate = sample_manifest_json("translator", "translate");
    // Nested violation the strict policy rejects: a skill with no tags.
    candidate["skills"][0]["tags"] = json!([]);

    let error = service
        .register(&candidate, None)
        .await
        .expect_err("strict policy should reject");
    assert!(matches!(error, RegistryError::Validation(_)));

    let lenient = service.with_policy(AcceptancePolicy::RequiredFieldsFallback);
    lenient
        .register(&candidate, None)
        .await
        .expect("fallback policy should accept a candidate with all root fields");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fallback_policy_still_rejects_missing_root_fields(service: TestService) {
    let lenient = service.with_policy(AcceptancePolicy::RequiredFieldsFallback);

    let error = lenient
        .register(&json!({ "name": "bare" }), None)
        .await
        .expect_err("missing root fields should still fail");

    assert!(matches!(error, RegistryError::Validation(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_of_unknown_id_is_not_found(service: TestService) {
    let error = service
        .get(AgentId::new())
        .await
        .expect_err("lookup should fail");

    assert!(matches!(error, RegistryError::NotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn heartbeat_refreshes_the_record(service: TestService) {
    let created = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect("registration should succeed");

    let touched = service
        .heartbeat(created.id())
        .await
        .expect("heartbeat should succeed");

    assert!(touched.last_heartbeat() >= created.last_heartbeat());
    assert_eq!(touched.created_at(), created.created_at());

    let error = service
        .heartbeat(AgentId::new())
        .await
        .expect_err("unknown id should fail");
    assert!(matches!(error, RegistryError::NotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_merges_only_patched_fields(service: TestService) {
    let created = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect("registration should succeed");

    let patch = ManifestPatch {
        description: Some("Now with glossaries".to_owned()),
        ..ManifestPatch::default()
    };
    let updated = service
        .update(created.id(), &patch)
        .await
        .expect("update should succeed");

    assert_eq!(updated.manifest().description, "Now with glossaries");
    assert_eq!(updated.manifest().name, created.manifest().name);
    assert_eq!(updated.manifest().skills, created.manifest().skills);
    assert_eq!(updated.created_at(), created.created_at());
    assert_eq!(updated.last_heartbeat(), created.last_heartbeat());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_of_unknown_id_is_not_found(service: TestService) {
    let error = service
        .update(AgentId::new(), &ManifestPatch::default())
        .await
        .expect_err("update should fail");

    assert!(matches!(error, RegistryError::NotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_the_record_exactly_once(service: TestService) {
    let created = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect("registration should succeed");

    service
        .delete(created.id())
        .await
        .expect("delete should succeed");
    assert_eq!(service.count().await.expect("count should succeed"), 0);

    let error = service
        .delete(created.id())
        .await
        .expect_err("second delete should fail");
    assert!(matches!(error, RegistryError::NotFound(_)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_returns_most_recent_registrations_first(service: TestService) {
    let first = service
        .register(&sample_manifest_json("alpha", "translate"), None)
        .await
        .expect("registration should succeed");
    let second = service
        .register(&sample_manifest_json("beta", "translate"), None)
        .await
        .expect("registration should succeed");

    let listed = service
        .list(&DiscoveryQuery::new())
        .await
        .expect("listing should succeed");

    let ids: Vec<AgentId> = listed.iter().map(ManifestRecord::id).collect();
    assert_eq!(ids, vec![second.id(), first.id()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_applies_filters(service: TestService) {
    service
        .register(&sample_manifest_json("Translator", "translate"), None)
        .await
        .expect("registration should succeed");
    service
        .register(&sample_manifest_json("Summariser", "summarise"), None)
        .await
        .expect("registration should succeed");

    let by_skill = service
        .list(&DiscoveryQuery::new().with_skill("summarise"))
        .await
        .expect("listing should succeed");
    assert_eq!(by_skill.len(), 1);
    assert_eq!(by_skill.first().map(|r| r.manifest().name.as_str()), Some("Summariser"));

    let by_name = service
        .list(&DiscoveryQuery::new().with_name("trans"))
        .await
        .expect("listing should succeed");
    assert_eq!(by_name.len(), 1);

    let none = service
        .list(&DiscoveryQuery::new().with_owner("nobody"))
        .await
        .expect("listing should succeed");
    assert!(none.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn storage_failures_surface_as_store_errors() {
    let mut repository = MockRepository::new();
    repository.expect_insert().with(always()).returning(|_| {
        Err(ManifestStoreError::persistence(std::io::Error::other(
            "disk on fire",
        )))
    });
    let service = service_over(repository);

    let error = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect_err("registration should fail");

    assert!(matches!(error, RegistryError::Store(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_identifier_from_storage_is_reported() {
    let mut repository = MockRepository::new();
    repository
        .expect_insert()
        .with(always())
        .returning(|record| Err(ManifestStoreError::DuplicateId(record.id())));
    let service = service_over(repository);

    let error = service
        .register(&sample_manifest_json("translator", "translate"), None)
        .await
        .expect_err("registration should fail");

    assert!(matches!(
        error,
        RegistryError::Store(ManifestStoreError::DuplicateId(_))
    ));
}
