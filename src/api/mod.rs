//! HTTP bindings for the registry operations.
//!
//! A thin axum layer: handlers translate requests into
//! [`RegistryService`] calls and map the service error taxonomy onto
//! status codes. Validation failures (bad input) and unknown ids (no such
//! agent) surface with distinct statuses so clients can tell them apart.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::registry::adapters::sqlite::SqliteManifestStore;
use crate::registry::discovery::DiscoveryQuery;
use crate::registry::domain::{AgentId, AgentManifest, CapabilityFlag, ManifestPatch};
use crate::registry::services::{RegistryError, RegistryService};

/// The service configuration served over HTTP.
pub type RegistryApi = RegistryService<SqliteManifestStore, DefaultClock>;

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    service: Arc<RegistryApi>,
}

/// Builds the registry router.
#[must_use]
pub fn router(service: Arc<RegistryApi>) -> Router {
    Router::new()
        .route("/agents/register", post(register_agent))
        .route("/agents", get(list_agents))
        .route(
            "/agents/{id}",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
        .route("/agents/{id}/heartbeat", post(heartbeat))
        .route("/agents/{id}/invoke_url", get(invoke_url))
        .route("/health", get(health))
        .with_state(AppState { service })
}

/// A stored record on the wire: manifest fields flattened to the top
/// level, registry metadata merged alongside.
#[derive(Debug, Serialize)]
struct RecordBody {
    #[serde(flatten)]
    manifest: AgentManifest,
    id: AgentId,
    owner: Option<String>,
    created_at: DateTime<Utc>,
    last_heartbeat: DateTime<Utc>,
}

impl From<crate::registry::domain::ManifestRecord> for RecordBody {
    fn from(record: crate::registry::domain::ManifestRecord) -> Self {
        Self {
            id: record.id(),
            owner: record.owner().map(str::to_owned),
            created_at: record.created_at(),
            last_heartbeat: record.last_heartbeat(),
            manifest: record.manifest().clone(),
        }
    }
}

/// Error wrapper mapping the service taxonomy onto responses.
#[derive(Debug)]
struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            RegistryError::Validation(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": report.to_string() })),
            )
                .into_response(),
            RegistryError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Agent not found" })),
            )
                .into_response(),
            RegistryError::MalformedInput(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": message })),
            )
                .into_response(),
            RegistryError::Store(err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "storage unavailable" })),
                )
                    .into_response()
            }
        }
    }
}

/// Query parameters accepted by the list operation.
#[derive(Debug, Default, Deserialize)]
struct ListParams {
    skill: Option<String>,
    name: Option<String>,
    owner: Option<String>,
    /// Comma-separated capability flag names, either spelling.
    capabilities: Option<String>,
    only_alive: Option<bool>,
}

impl ListParams {
    fn into_query(self) -> Result<DiscoveryQuery, ApiError> {
        let mut query = DiscoveryQuery::new();
        if let Some(skill) = self.skill {
            query = query.with_skill(skill);
        }
        if let Some(name) = self.name {
            query = query.with_name(name);
        }
        if let Some(owner) = self.owner {
            query = query.with_owner(owner);
        }
        if let Some(raw) = self.capabilities {
            let flags = CapabilityFlag::parse_list(&raw)
                .map_err(|err| ApiError(RegistryError::MalformedInput(err.to_string())))?;
            for flag in flags {
                query = query.with_capability(flag);
            }
        }
        if self.only_alive == Some(true) {
            query = query.with_only_alive();
        }
        Ok(query)
    }
}

async fn register_agent(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordBody>), ApiError> {
    let Json(mut payload) = body
        .map_err(|rejection| ApiError(RegistryError::MalformedInput(rejection.body_text())))?;

    // The owner tag rides alongside the manifest in the request body; it
    // is registry metadata, not manifest content.
    let owner = match payload
        .as_object_mut()
        .and_then(|object| object.remove("owner"))
    {
        None | Some(Value::Null) => None,
        Some(Value::String(owner)) => Some(owner),
        Some(_) => {
            return Err(ApiError(RegistryError::MalformedInput(
                "owner must be a string".to_owned(),
            )));
        }
    };

    let record = state.service.register(&payload, owner).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn list_agents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RecordBody>>, ApiError> {
    let query = params.into_query()?;
    let records = state.service.list(&query).await?;
    Ok(Json(records.into_iter().map(RecordBody::from).collect()))
}

async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordBody>, ApiError> {
    let record = state.service.get(parse_id(&id)?).await?;
    Ok(Json(record.into()))
}

async fn heartbeat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordBody>, ApiError> {
    let record = state.service.heartbeat(parse_id(&id)?).await?;
    Ok(Json(record.into()))
}

async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ManifestPatch>, JsonRejection>,
) -> Result<Json<RecordBody>, ApiError> {
    let Json(patch) = body
        .map_err(|rejection| ApiError(RegistryError::MalformedInput(rejection.body_text())))?;
    let record = state.service.update(parse_id(&id)?, &patch).await?;
    Ok(Json(record.into()))
}

async fn delete_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn invoke_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.service.get(parse_id(&id)?).await?;
    Ok(Json(json!({
        "agent_id": record.id(),
        "invoke_url": record.manifest().url,
        "note": "Invoke the agent at this endpoint per its declared transport.",
        "agent_card": record.manifest(),
    })))
}

#[expect(clippy::unused_async, reason = "axum handlers must be async")]
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "time": Utc::now().to_rfc3339() }))
}

/// An id that does not parse as a UUID cannot name a stored record, so it
/// behaves exactly like an unknown id.
fn parse_id(raw: &str) -> Result<AgentId, ApiError> {
    AgentId::from_str(raw).map_err(|_| {
        ApiError(RegistryError::NotFound(AgentId::from_uuid(uuid::Uuid::nil())))
    })
}
