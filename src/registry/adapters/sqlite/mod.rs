//! SQLite adapters for manifest persistence.

mod models;
mod repository;
mod schema;

pub use repository::{SqliteManifestStore, StorageMode};
