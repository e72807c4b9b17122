//! Domain model for agent manifest registration and discovery.
//!
//! The registry domain models the published manifest document, the stored
//! record pairing it with registry-owned metadata, and partial manifest
//! updates. All infrastructure concerns are kept outside the domain
//! boundary.

mod capabilities;
mod error;
mod ids;
mod manifest;
mod record;

pub use capabilities::{CapabilityFlag, ManifestCapabilities};
pub use error::ParseCapabilityFlagError;
pub use ids::AgentId;
pub use manifest::{
    AgentCardSignature, AgentExtension, AgentInterface, AgentManifest, AgentProvider, AgentSkill,
    ManifestPatch,
};
pub use record::{ManifestRecord, PersistedRecordData};
