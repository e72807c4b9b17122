//! Port contracts for manifest persistence and discovery.
//!
//! Ports define infrastructure-agnostic interfaces used by the registry
//! service.

pub mod repository;

pub use repository::{ManifestRepository, ManifestStoreError, StoreResult};
