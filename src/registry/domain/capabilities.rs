//! Capability flag declarations for agent manifests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::manifest::AgentExtension;
use super::ParseCapabilityFlagError;

/// Optional protocol capabilities declared by an agent manifest.
///
/// Each boolean flag accepts both its camelCase and snake_case wire
/// spelling on input; serialisation always emits camelCase. Absent flags
/// are treated as disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCapabilities {
    /// Whether the agent supports streamed (SSE) responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,

    /// Whether the agent can send push notifications for async updates.
    #[serde(default, alias = "push_notifications", skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,

    /// Whether the agent exposes a history of task state transitions.
    #[serde(default, alias = "state_transition_history", skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,

    /// Protocol extensions supported by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<AgentExtension>>,
}

impl ManifestCapabilities {
    /// Returns whether the given flag is declared and enabled.
    #[must_use]
    pub const fn flag(&self, flag: CapabilityFlag) -> bool {
        let value = match flag {
            CapabilityFlag::Streaming => self.streaming,
            CapabilityFlag::PushNotifications => self.push_notifications,
            CapabilityFlag::StateTransitionHistory => self.state_transition_history,
        };
        matches!(value, Some(true))
    }
}

/// A named boolean capability that discovery queries can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityFlag {
    /// Streamed response support.
    Streaming,
    /// Push notification support.
    PushNotifications,
    /// State transition history support.
    StateTransitionHistory,
}

impl CapabilityFlag {
    /// Returns the canonical (camelCase) wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::PushNotifications => "pushNotifications",
            Self::StateTransitionHistory => "stateTransitionHistory",
        }
    }

    /// Parses a comma-separated flag list as accepted by the `capabilities`
    /// query parameter. Blank entries are skipped; unknown names are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ParseCapabilityFlagError`] for the first unrecognised name.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ParseCapabilityFlagError> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Self::from_str)
            .collect()
    }
}

impl FromStr for CapabilityFlag {
    type Err = ParseCapabilityFlagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "streaming" => Ok(Self::Streaming),
            "pushNotifications" | "push_notifications" => Ok(Self::PushNotifications),
            "stateTransitionHistory" | "state_transition_history" => {
                Ok(Self::StateTransitionHistory)
            }
            other => Err(ParseCapabilityFlagError(other.to_owned())),
        }
    }
}

impl fmt::Display for CapabilityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
