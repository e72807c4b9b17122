//! Declarative manifest schema loaded from a data file.
//!
//! The manifest shape lives in `schemas/agent_manifest.schema.json` as a
//! map of shape name → field name → field specification, evaluated by the
//! generic walker in [`super::validator`]. Evolving the accepted shape
//! means editing the data file, not the validation code.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Embedded schema source compiled into the binary.
const EMBEDDED_SCHEMA: &str = include_str!("../../../schemas/agent_manifest.schema.json");

/// Errors raised while loading a schema definition.
///
/// A broken schema is a configuration defect, so these are fatal at
/// startup rather than per-request failures.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema source is not valid JSON or not the expected shape.
    #[error("schema source is not parseable: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field references a shape that the schema does not define.
    #[error("schema field '{field}' references undefined shape '{shape}'")]
    UnknownShape {
        /// The referencing field name.
        field: String,
        /// The missing shape name.
        shape: String,
    },

    /// The declared root shape is not defined.
    #[error("schema root shape '{0}' is not defined")]
    MissingRoot(String),
}

/// Expected JSON type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// A JSON string.
    String,
    /// A JSON boolean.
    Boolean,
    /// A JSON number.
    Number,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// Any JSON value.
    Any,
}

impl FieldKind {
    /// Returns the lowercase name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Object => "object",
            Self::Array => "array",
            Self::Any => "any",
        }
    }

    /// Returns whether the given JSON value has this type.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

/// Returns the lowercase JSON type name of a value, for messages.
#[must_use]
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Specification of one field within a shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Expected JSON type. Defaults to `any`.
    #[serde(rename = "type", default = "FieldKind::default_any")]
    pub kind: FieldKind,
    /// Whether an empty string or array is rejected.
    #[serde(default)]
    pub non_empty: bool,
    /// Element specification for array fields.
    #[serde(default)]
    pub items: Option<Box<FieldSpec>>,
    /// Nested shape name for object values.
    #[serde(default)]
    pub shape: Option<String>,
    /// Alternative accepted spellings of the field name.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl FieldKind {
    const fn default_any() -> Self {
        Self::Any
    }
}

/// A named object shape: its fields and whether extras are tolerated.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeSpec {
    /// Declared fields, keyed by canonical name.
    pub fields: BTreeMap<String, FieldSpec>,
    /// Whether undeclared fields are accepted without violation.
    #[serde(default)]
    pub allow_additional: bool,
}

impl ShapeSpec {
    /// Resolves a document key to the canonical field it spells, if any.
    ///
    /// Aliases (e.g. `push_notifications` for `pushNotifications`) resolve
    /// to the same canonical field.
    #[must_use]
    pub fn resolve_field(&self, key: &str) -> Option<(&str, &FieldSpec)> {
        self.fields
            .iter()
            .find(|(name, spec)| {
                name.as_str() == key || spec.aliases.iter().any(|alias| alias == key)
            })
            .map(|(name, spec)| (name.as_str(), spec))
    }

    /// Returns the canonical names of required fields.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
    }

    /// Returns whether the document key spells a declared field, under any
    /// accepted spelling.
    #[must_use]
    pub fn declares(&self, key: &str) -> bool {
        self.resolve_field(key).is_some()
    }
}

/// The full declarative manifest schema.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSchema {
    /// Name of the shape candidate documents are validated against.
    pub root: String,
    /// All shapes the schema defines.
    pub shapes: BTreeMap<String, ShapeSpec>,
}

impl ManifestSchema {
    /// Parses a schema from JSON source and checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the source is unparseable, when the
    /// root shape is missing, or when a field references an undefined
    /// shape.
    pub fn from_source(source: &str) -> Result<Self, SchemaError> {
        let schema: Self = serde_json::from_str(source)?;
        schema.check_references()?;
        Ok(schema)
    }

    /// Loads the schema embedded at compile time.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the embedded file is malformed. This is
    /// a build defect and should abort startup.
    pub fn embedded() -> Result<Self, SchemaError> {
        Self::from_source(EMBEDDED_SCHEMA)
    }

    /// Returns the shape candidate documents are validated against.
    ///
    /// Reference consistency is checked at construction, so the root is
    /// always present on a loaded schema.
    #[must_use]
    pub fn root_shape(&self) -> Option<&ShapeSpec> {
        self.shapes.get(&self.root)
    }

    /// Looks up a shape by name.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&ShapeSpec> {
        self.shapes.get(name)
    }

    fn check_references(&self) -> Result<(), SchemaError> {
        if !self.shapes.contains_key(&self.root) {
            return Err(SchemaError::MissingRoot(self.root.clone()));
        }
        for shape in self.shapes.values() {
            for (field_name, spec) in &shape.fields {
                self.check_field_references(field_name, spec)?;
            }
        }
        Ok(())
    }

    fn check_field_references(&self, field_name: &str, spec: &FieldSpec) -> Result<(), SchemaError> {
        if let Some(shape_name) = &spec.shape
            && !self.shapes.contains_key(shape_name)
        {
            return Err(SchemaError::UnknownShape {
                field: field_name.to_owned(),
                shape: shape_name.clone(),
            });
        }
        if let Some(items) = &spec.items {
            self.check_field_references(field_name, items)?;
        }
        Ok(())
    }
}
