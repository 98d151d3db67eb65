//! Validation error taxonomy.
//!
//! Every violated rule yields one [`FieldError`] scoped to the form field it
//! concerns. A failed validation pass returns all of them at once as
//! [`FieldErrors`], so the UI can show every problem in a single round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::FieldPath;

/// The kind of rule an input violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required value is absent or blank.
    MissingField,
    /// The value is not a real `YYYY-MM-DD` calendar date.
    MalformedDate,
    /// The end date precedes the start date.
    OrderingViolation,
    /// The range is longer than one calendar year.
    SpanViolation,
    /// The start date precedes the earliest date with archive coverage.
    BelowFloor,
}

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: FieldPath,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(path: FieldPath, kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Non-empty, field-ordered set of validation failures.
///
/// Serialize only: a set is built by the schema, never read back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Wraps already-grouped errors. Returns `None` for an empty list, since a
    /// pass with no failures is a valid form, not an error.
    pub(crate) fn from_grouped(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    /// Errors reported against one field, in rule order.
    pub fn for_field(&self, path: FieldPath) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter(move |e| e.path == path)
    }

    /// The first message for a field, as an input widget would show it.
    pub fn first_message(&self, path: FieldPath) -> Option<&str> {
        self.for_field(path).next().map(|e| e.message.as_str())
    }

    pub fn has_kind(&self, kind: ValidationErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }

    /// A one-line summary of all errors.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid form input: {}", self.summary())
    }
}

impl std::error::Error for FieldErrors {}

impl<'a> IntoIterator for &'a FieldErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Failure to read text as a canonical `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("date must use the YYYY-MM-DD format, got {0:?}")]
    Format(String),

    #[error("{0} is not a calendar date")]
    NotACalendarDate(String),
}
