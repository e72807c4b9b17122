//! In-memory adapters for manifest persistence.

mod manifest_store;

pub use manifest_store::InMemoryManifestStore;
