//! Schema-driven structural validation for candidate manifests.
//!
//! The accepted manifest shape is declared in a data file
//! (`schemas/agent_manifest.schema.json`) and evaluated by a generic
//! walker, so the shape can evolve without touching validation logic.
//! Validation runs before anything is persisted; a failing candidate never
//! reaches the store.

mod schema;
mod validator;
mod violation;

pub use schema::{FieldKind, FieldSpec, ManifestSchema, SchemaError, ShapeSpec};
pub use validator::ManifestValidator;
pub use violation::{
    PathSegment, SchemaViolation, ValidationReport, ViolationKind, ViolationPath,
};
