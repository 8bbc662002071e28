//! Error types for envcheck.
//!
//! Two families of errors exist:
//!
//! - **Fatal** errors stop a check immediately: the env file could not be
//!   found, read, or parsed ([`SourceError`]), or the schema itself is broken
//!   ([`SchemaError`]).
//! - **Field** errors ([`FieldError`]) are collected across the whole schema
//!   and returned together as a [`ValidationReport`], so a single run shows
//!   every misconfigured variable.

use std::fmt;
use std::io;
use std::path::Path;

use stillwater::{NonEmptyVec, Semigroup, Validation};
use thiserror::Error;

use crate::value::TypeKind;

/// Location where a raw value originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Name of the source (e.g., ".env", "env:PORT", "default")
    pub source: String,
    /// Line number in the source (1-indexed), if applicable
    pub line: Option<u32>,
}

impl SourceLocation {
    /// Create a new source location with just a source name.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: None,
        }
    }

    /// Add a line number to this location.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Create a location for a process environment variable.
    pub fn env(var_name: &str) -> Self {
        Self::new(format!("env:{}", var_name))
    }

    /// Location of a value taken from a schema default.
    pub fn schema_default() -> Self {
        Self::new("default")
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.source, line),
            None => write!(f, "{}", self.source),
        }
    }
}

/// Kinds of source loading errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Env file was not found
    NotFound { path: String },
    /// Env file exists but could not be read
    IoError { message: String },
    /// A line does not follow the `[export ]KEY=VALUE` grammar
    ParseError { line: u32, content: String },
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::NotFound { path } => write!(f, "file not found: {}", path),
            SourceErrorKind::IoError { message } => write!(f, "I/O error: {}", message),
            SourceErrorKind::ParseError { line, content } => {
                write!(f, "parse error at line {}: {:?}", line, content)
            }
        }
    }
}

/// An env file failed to load. Always fatal to the check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}: {kind}")]
pub struct SourceError {
    pub source_name: String,
    pub kind: SourceErrorKind,
}

impl SourceError {
    /// Create a source error.
    pub fn new(source_name: impl Into<String>, kind: SourceErrorKind) -> Self {
        Self {
            source_name: source_name.into(),
            kind,
        }
    }

    /// Map a failed file read, keeping not-found apart from other I/O errors.
    pub fn from_io(source_name: impl Into<String>, path: &Path, err: &io::Error) -> Self {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            SourceErrorKind::NotFound {
                path: path.display().to_string(),
            }
        } else {
            SourceErrorKind::IoError {
                message: err.to_string(),
            }
        };
        Self::new(source_name, kind)
    }

    /// Check if the file was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, SourceErrorKind::NotFound { .. })
    }

    /// Line number of a parse failure, if this is one.
    pub fn line(&self) -> Option<u32> {
        match self.kind {
            SourceErrorKind::ParseError { line, .. } => Some(line),
            _ => None,
        }
    }
}

/// The schema could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field names a type that is not one of `string`, `bool`, `int`, `float`
    #[error("unknown type '{type_name}' for '{field}' (expected string, bool, int or float)")]
    UnknownType { field: String, type_name: String },

    /// A field's regex does not compile
    #[error("invalid pattern '{pattern}' for '{field}': {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    /// The schema document is malformed (bad syntax, unknown keys, wrong shapes)
    #[error("invalid schema document: {message}")]
    Format { message: String },

    /// A schema file's extension names no supported or enabled format
    #[error("unsupported schema format for '{path}' (expected .json, .toml, .yaml or .yml)")]
    UnsupportedFormat { path: String },
}

/// What went wrong with one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// Required variable absent with no default
    MissingRequiredVariable,
    /// Value could not be coerced to the declared type
    TypeMismatch {
        kind: TypeKind,
        raw: String,
        message: String,
    },
    /// Value present but does not match the declared pattern
    PatternMismatch { pattern: String, raw: String },
}

/// A single schema field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Variable name as declared in the schema
    pub name: String,
    pub kind: FieldErrorKind,
    /// Where the offending value came from (None for missing variables)
    pub location: Option<SourceLocation>,
}

impl FieldError {
    /// A required variable is missing.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldErrorKind::MissingRequiredVariable,
            location: None,
        }
    }

    /// A value could not be coerced to `kind`.
    pub fn type_mismatch(
        name: impl Into<String>,
        kind: TypeKind,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldErrorKind::TypeMismatch {
                kind,
                raw: raw.into(),
                message: message.into(),
            },
            location: None,
        }
    }

    /// A value does not match `pattern`.
    pub fn pattern_mismatch(
        name: impl Into<String>,
        pattern: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldErrorKind::PatternMismatch {
                pattern: pattern.into(),
                raw: raw.into(),
            },
            location: None,
        }
    }

    /// Attach the location of the offending value.
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Human-readable description of the problem.
    pub fn detail(&self) -> String {
        match &self.kind {
            FieldErrorKind::MissingRequiredVariable => "missing required variable".to_string(),
            FieldErrorKind::TypeMismatch { kind, raw, message } => {
                format!("expected {}, got \"{}\": {}", kind, raw, message)
            }
            FieldErrorKind::PatternMismatch { pattern, raw } => {
                format!("value \"{}\" does not match pattern '{}'", raw, pattern)
            }
        }
    }

    /// Whether the variable was absent with no default.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, FieldErrorKind::MissingRequiredVariable)
    }

    /// Whether the value failed coercion to the declared type.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, FieldErrorKind::TypeMismatch { .. })
    }

    /// Whether the raw value failed the declared pattern.
    pub fn is_pattern_mismatch(&self) -> bool {
        matches!(self.kind, FieldErrorKind::PatternMismatch { .. })
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "[{}] '{}': {}", loc, self.name, self.detail()),
            None => write!(f, "'{}': {}", self.name, self.detail()),
        }
    }
}

impl std::error::Error for FieldError {}

/// Every field error found in one validation pass.
///
/// Wraps `NonEmptyVec` from stillwater, so a report always holds at least one
/// error. A clean pass returns the validated config instead of a report.
#[derive(Debug, Clone)]
pub struct ValidationReport(pub NonEmptyVec<FieldError>);

impl ValidationReport {
    /// Create from a single error.
    pub fn single(error: FieldError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &FieldError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, kept for API consistency.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors in schema order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Names of the variables that failed, in report order (may repeat).
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|e| e.name.as_str()).collect()
    }

    /// All errors reported for one variable.
    pub fn for_field<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.iter().filter(move |e| e.name == name)
    }
}

impl Semigroup for ValidationReport {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<FieldError> for ValidationReport {
    fn from(error: FieldError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ValidationReport {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Environment errors ({}):", self.len())?;
        for error in self.iter() {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// The standard validation result type for envcheck.
pub type CheckValidation<T> = Validation<T, ValidationReport>;

/// Extension trait for creating failing validations easily.
pub trait CheckValidationExt<T> {
    /// Create a failing validation with a single error.
    fn fail_with(error: FieldError) -> CheckValidation<T>;
}

impl<T> CheckValidationExt<T> for CheckValidation<T> {
    fn fail_with(error: FieldError) -> CheckValidation<T> {
        Validation::Failure(ValidationReport::single(error))
    }
}

/// Top-level error returned by [`validate_env`](crate::validate_env) and
/// [`EnvCheck::run`](crate::EnvCheck::run).
#[derive(Debug, Clone, Error)]
pub enum EnvCheckError {
    /// The env file or schema file could not be loaded
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The schema is broken
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// One or more fields failed validation
    #[error("{0}")]
    Invalid(ValidationReport),
}

impl EnvCheckError {
    /// The aggregated field errors, if validation ran and failed.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            EnvCheckError::Invalid(report) => Some(report),
            _ => None,
        }
    }

    /// Consume into the aggregated field errors, if any.
    pub fn into_report(self) -> Option<ValidationReport> {
        match self {
            EnvCheckError::Invalid(report) => Some(report),
            _ => None,
        }
    }
}

impl From<ValidationReport> for EnvCheckError {
    fn from(report: ValidationReport) -> Self {
        EnvCheckError::Invalid(report)
    }
}
