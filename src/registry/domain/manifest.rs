//! The self-describing manifest document published by an agent.
//!
//! Wire names are camelCase to match the agent card interchange format;
//! structural validation of incoming documents happens in
//! [`crate::registry::validation`] before any of these types are built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::capabilities::ManifestCapabilities;

/// A distinct capability or function that an agent can perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    /// Identifier for the skill, unique within its manifest.
    pub id: String,
    /// Human-readable skill name.
    pub name: String,
    /// Description of what the skill does.
    pub description: String,
    /// Keywords describing the skill. Non-empty by schema.
    pub tags: Vec<String>,
    /// Example prompts or scenarios the skill can handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    /// Input MIME types overriding the manifest defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,
    /// Output MIME types overriding the manifest defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
    /// Security requirements specific to this skill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,
}

/// A protocol extension declared by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentExtension {
    /// URI uniquely identifying the extension.
    pub uri: String,
    /// How this agent uses the extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether clients must understand the extension to interact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Extension-specific configuration parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// The service provider behind an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProvider {
    /// Provider organisation name.
    pub organization: String,
    /// Provider website or documentation URL.
    pub url: String,
}

/// An additional endpoint and transport combination for reaching an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInterface {
    /// Endpoint URL for this interface.
    pub url: String,
    /// Transport protocol served at the URL.
    pub transport: String,
}

/// A JWS signature over an agent manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCardSignature {
    /// Protected JWS header.
    pub protected: String,
    /// Base64url-encoded signature value.
    pub signature: String,
    /// Unprotected JWS header values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Value>,
}

/// The capability document an agent publishes to the registry.
///
/// The manifest content is owned by the publishing agent and copied into a
/// [`super::ManifestRecord`] at registration time; the registry never holds
/// a live reference back to the publisher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentManifest {
    /// Human-readable agent name. Not unique across the registry.
    pub name: String,
    /// What the agent does.
    pub description: String,
    /// The agent's own version string.
    pub version: String,
    /// Version of the agent protocol this manifest conforms to.
    pub protocol_version: String,
    /// Preferred invocation endpoint.
    pub url: String,
    /// The skills the agent offers. Non-empty by schema.
    pub skills: Vec<AgentSkill>,
    /// Optional protocol capability flags.
    pub capabilities: ManifestCapabilities,
    /// Default input MIME types for all skills.
    pub default_input_modes: Vec<String>,
    /// Default output MIME types for all skills.
    pub default_output_modes: Vec<String>,
    /// Transport protocol for the preferred endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_transport: Option<String>,
    /// Service provider metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,
    /// Documentation URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Additional endpoint and transport combinations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_interfaces: Option<Vec<AgentInterface>>,
    /// Security requirements for all interactions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<Value>>,
    /// Declared security schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<Value>,
    /// JWS signatures computed over this manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<AgentCardSignature>>,
    /// Whether an authenticated extended card is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_authenticated_extended_card: Option<bool>,
}

impl AgentManifest {
    /// Returns whether any skill in the manifest has the given id.
    #[must_use]
    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.skills.iter().any(|skill| skill.id == skill_id)
    }

    /// Merges a partial update into the manifest.
    ///
    /// Only fields present in the patch are replaced; everything else is
    /// left untouched.
    pub fn apply(&mut self, patch: &ManifestPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(url) = &patch.url {
            self.url.clone_from(url);
        }
        if let Some(version) = &patch.version {
            self.version.clone_from(version);
        }
        if let Some(protocol_version) = &patch.protocol_version {
            self.protocol_version.clone_from(protocol_version);
        }
        if let Some(capabilities) = &patch.capabilities {
            self.capabilities.clone_from(capabilities);
        }
        if let Some(skills) = &patch.skills {
            self.skills.clone_from(skills);
        }
    }
}

/// Partial manifest update for the registry's update operation.
///
/// Mirrors the updatable subset of [`AgentManifest`]; fields left as `None`
/// are not touched by the merge. Record metadata (id, owner, timestamps) is
/// never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPatch {
    /// Replacement agent name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement invocation endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Replacement version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Replacement protocol version.
    #[serde(default, alias = "protocol_version", skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    /// Replacement capability declarations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<ManifestCapabilities>,
    /// Replacement skill list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<AgentSkill>>,
}

impl ManifestPatch {
    /// Returns whether the patch carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.version.is_none()
            && self.protocol_version.is_none()
            && self.capabilities.is_none()
            && self.skills.is_none()
    }
}
