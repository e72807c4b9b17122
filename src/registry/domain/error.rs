//! Error types for registry domain parsing.

use thiserror::Error;

/// Error returned while parsing a capability flag name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability flag: {0}")]
pub struct ParseCapabilityFlagError(pub String);
