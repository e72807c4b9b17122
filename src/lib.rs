//! Pharos: a discovery registry for autonomous agents.
//!
//! Agents publish self-describing manifests to the registry; clients query
//! it to find agents by skill, name, owner, capability flags, or recency
//! of heartbeat. The registry owns record metadata (identifier, owner tag,
//! timestamps) while the manifest content stays owned by the publishing
//! agent.
//!
//! # Architecture
//!
//! Pharos follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `SQLite`)
//!
//! # Modules
//!
//! - [`registry`]: Manifest validation, storage, discovery, and liveness
//! - [`api`]: HTTP bindings over the registry service

pub mod api;
pub mod registry;
