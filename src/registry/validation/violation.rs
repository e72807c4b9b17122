//! Structured validation violations with document paths.

use serde::Serialize;
use std::fmt;

/// One step in a path from the document root to a violating value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Path from the document root to the location of a violation.
///
/// Renders as `root` for an empty path, otherwise as segments joined with
/// arrows, e.g. `skills → 0 → id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ViolationPath(Vec<PathSegment>);

impl ViolationPath {
    /// Creates the root path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path extended with an object key.
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns a new path extended with an array index.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns the path segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for ViolationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str(" → ")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

/// Classification of a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// A required field is absent.
    MissingRequiredField,
    /// A field not declared by the shape is present.
    UnexpectedAdditionalField,
    /// A value has the wrong JSON type or is empty where forbidden.
    TypeMismatch,
    /// Anything else, including unparseable candidate documents.
    Other,
}

/// A single path-qualified schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// Where in the document the violation occurred.
    pub path: ViolationPath,
    /// Violation classification.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

impl SchemaViolation {
    /// Creates a violation at the given path.
    #[must_use]
    pub fn new(path: ViolationPath, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error at {}: {}", self.path, self.message)
    }
}

/// The complete, ordered violation list for one candidate document.
///
/// An empty report means the candidate passed. Rendering joins the
/// violations one per line, which is the format surfaced to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport(Vec<SchemaViolation>);

impl ValidationReport {
    /// Creates an empty (passing) report.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a report with a single violation.
    #[must_use]
    pub fn single(violation: SchemaViolation) -> Self {
        Self(vec![violation])
    }

    /// Adds a violation to the report.
    pub fn push(&mut self, violation: SchemaViolation) {
        self.0.push(violation);
    }

    /// Returns whether the candidate passed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of violations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the violations in document order.
    #[must_use]
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.0
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            write!(f, "{violation}")?;
            first = false;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationReport {
    type Item = SchemaViolation;
    type IntoIter = std::vec::IntoIter<SchemaViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
