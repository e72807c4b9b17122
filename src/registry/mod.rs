//! Agent manifest registration and discovery.
//!
//! This module implements the registry proper: publishing self-describing
//! agent manifests, finding agents by skill, name, owner, capability
//! flags, and liveness, and tracking heartbeats. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Schema-driven validation in [`validation`]
//! - Discovery filters and the liveness policy in [`discovery`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod discovery;
pub mod domain;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
