//! Generic walker evaluating candidate documents against the schema.

use serde_json::{Map, Value};

use super::schema::{value_type_name, FieldKind, FieldSpec, ManifestSchema, SchemaError, ShapeSpec};
use super::violation::{SchemaViolation, ValidationReport, ViolationKind, ViolationPath};

/// Structural validator for candidate agent manifests.
///
/// The validator is a pure function over its schema and the input: it
/// reports every violation it finds, never just the first, and persists
/// nothing. Each violation carries the path from the document root and a
/// classification.
///
/// # Examples
///
/// ```
/// use pharos::registry::validation::ManifestValidator;
/// use serde_json::json;
///
/// let validator = ManifestValidator::with_embedded_schema().expect("embedded schema");
/// let report = validator.validate(&json!({"name": "EchoAgent"}));
/// assert!(!report.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ManifestValidator {
    schema: ManifestSchema,
}

impl ManifestValidator {
    /// Creates a validator over an already-loaded schema.
    #[must_use]
    pub const fn new(schema: ManifestSchema) -> Self {
        Self { schema }
    }

    /// Creates a validator over the schema embedded at compile time.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the embedded schema source is
    /// malformed; this is fatal for startup.
    pub fn with_embedded_schema() -> Result<Self, SchemaError> {
        Ok(Self::new(ManifestSchema::embedded()?))
    }

    /// Returns the schema the validator evaluates against.
    #[must_use]
    pub const fn schema(&self) -> &ManifestSchema {
        &self.schema
    }

    /// Validates a candidate document. An empty report means it passed.
    #[must_use]
    pub fn validate(&self, candidate: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        let Some(root) = self.schema.root_shape() else {
            report.push(SchemaViolation::new(
                ViolationPath::root(),
                ViolationKind::Other,
                "schema has no root shape",
            ));
            return report;
        };
        self.check_shape(candidate, root, &ViolationPath::root(), &mut report);
        report
    }

    /// Validates raw JSON text. Unparseable input yields a single `other`
    /// violation at the root rather than an error.
    #[must_use]
    pub fn validate_str(&self, raw: &str) -> ValidationReport {
        match serde_json::from_str::<Value>(raw) {
            Ok(candidate) => self.validate(&candidate),
            Err(err) => ValidationReport::single(SchemaViolation::new(
                ViolationPath::root(),
                ViolationKind::Other,
                format!("candidate is not valid JSON: {err}"),
            )),
        }
    }

    /// Looser acceptance check: are all root-level required fields present?
    ///
    /// Nested shapes and value types are not inspected. Callers decide
    /// whether passing this weaker check is enough to accept a candidate
    /// that failed [`Self::validate`].
    #[must_use]
    pub fn check_required_only(&self, candidate: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();
        let Some(root) = self.schema.root_shape() else {
            report.push(SchemaViolation::new(
                ViolationPath::root(),
                ViolationKind::Other,
                "schema has no root shape",
            ));
            return report;
        };
        let Some(object) = candidate.as_object() else {
            report.push(SchemaViolation::new(
                ViolationPath::root(),
                ViolationKind::TypeMismatch,
                format!("expected object, found {}", value_type_name(candidate)),
            ));
            return report;
        };
        report_missing_fields(root, object, &ViolationPath::root(), &mut report);
        report
    }

    fn check_shape(
        &self,
        value: &Value,
        shape: &ShapeSpec,
        path: &ViolationPath,
        report: &mut ValidationReport,
    ) {
        let Some(object) = value.as_object() else {
            report.push(SchemaViolation::new(
                path.clone(),
                ViolationKind::TypeMismatch,
                format!("expected object, found {}", value_type_name(value)),
            ));
            return;
        };

        report_missing_fields(shape, object, path, report);

        for (key, field_value) in object {
            match shape.resolve_field(key) {
                Some((_, spec)) => {
                    self.check_field(field_value, spec, &path.child_key(key), report);
                }
                None if shape.allow_additional => {}
                None => report.push(SchemaViolation::new(
                    path.clone(),
                    ViolationKind::UnexpectedAdditionalField,
                    format!("unexpected field `{key}`"),
                )),
            }
        }
    }

    fn check_field(
        &self,
        value: &Value,
        spec: &FieldSpec,
        path: &ViolationPath,
        report: &mut ValidationReport,
    ) {
        if !spec.kind.accepts(value) {
            report.push(SchemaViolation::new(
                path.clone(),
                ViolationKind::TypeMismatch,
                format!(
                    "expected {}, found {}",
                    spec.kind.as_str(),
                    value_type_name(value)
                ),
            ));
            return;
        }

        if spec.non_empty && is_empty_value(value) {
            report.push(SchemaViolation::new(
                path.clone(),
                ViolationKind::TypeMismatch,
                format!("{} must not be empty", spec.kind.as_str()),
            ));
        }

        match spec.kind {
            FieldKind::Array => {
                if let (Some(items), Some(elements)) = (&spec.items, value.as_array()) {
                    for (index, element) in elements.iter().enumerate() {
                        self.check_field(element, items, &path.child_index(index), report);
                    }
                }
            }
            FieldKind::Object => {
                if let Some(shape_name) = &spec.shape
                    && let Some(shape) = self.schema.shape(shape_name)
                {
                    self.check_shape(value, shape, path, report);
                }
            }
            _ => {}
        }
    }
}

/// Pushes one missing-required-field violation per absent field, in the
/// shape's declaration order.
fn report_missing_fields(
    shape: &ShapeSpec,
    object: &Map<String, Value>,
    path: &ViolationPath,
    report: &mut ValidationReport,
) {
    for name in shape.required_fields() {
        let present = object.contains_key(name) || has_alias_spelling(shape, object, name);
        if !present {
            report.push(SchemaViolation::new(
                path.clone(),
                ViolationKind::MissingRequiredField,
                format!("missing required field `{name}`"),
            ));
        }
    }
}

fn has_alias_spelling(shape: &ShapeSpec, object: &Map<String, Value>, canonical: &str) -> bool {
    object
        .keys()
        .any(|key| matches!(shape.resolve_field(key), Some((name, _)) if name == canonical))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(text) => text.trim().is_empty(),
        Value::Array(elements) => elements.is_empty(),
        _ => false,
    }
}
