//! Serves the agent registry over HTTP.
//!
//! Configuration comes from the environment:
//!
//! - `DATABASE_PATH`: `SQLite` database file (default
//!   `agent_registry.db` in the working directory)
//! - `BIND_ADDR`: listen address (default `0.0.0.0:8000`)
//! - `RUST_LOG`: tracing filter (default `info`)
//!
//! The process runs until interrupted; shutdown drains in-flight requests.

use std::env;
use std::sync::Arc;

use mockable::DefaultClock;
use tracing_subscriber::EnvFilter;

use pharos::api::router;
use pharos::registry::adapters::sqlite::{SqliteManifestStore, StorageMode};
use pharos::registry::services::RegistryService;
use pharos::registry::validation::ManifestValidator;

const DEFAULT_DATABASE_PATH: &str = "agent_registry.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let database_path =
        env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_owned());
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_owned());

    let store = SqliteManifestStore::open(&StorageMode::file(&database_path))?;
    let validator = ManifestValidator::with_embedded_schema()?;
    let service = Arc::new(RegistryService::new(
        Arc::new(store),
        Arc::new(validator),
        Arc::new(DefaultClock),
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, %database_path, "agent registry listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("agent registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
}
