// Allow large error types - field errors carry raw values and locations
#![allow(clippy::result_large_err)]

//! envcheck: validate an app's `.env` file against a schema before it runs.
//!
//! Misconfiguration is caught at startup with one aggregated report instead
//! of surfacing as a runtime failure deep inside the application.
//!
//! # Core Concepts
//!
//! - **Error Accumulation**: every misconfigured variable is reported in one pass
//! - **Declarative Schema**: types (`string`, `bool`, `int`, `float`), regex
//!   patterns, defaults and optional variables, in code or loaded from JSON/TOML/YAML
//! - **Typed Output**: values come back as strings, booleans, `i64` and `f64`
//! - **Testable I/O**: file and process-environment access goes through `ConfigEnv`
//!
//! # Quick Start
//!
//! ```no_run
//! use envcheck::{validate_env, Schema};
//!
//! let schema = Schema::from_json_str(r#"{
//!     "DATABASE_URL": "string",
//!     "DEBUG": "bool",
//!     "PORT": "int",
//!     "USERNAME": { "regex": "^[a-zA-Z0-9_]+$" }
//! }"#)?;
//!
//! match validate_env(".env", &schema) {
//!     Ok(config) => println!("port = {:?}", config.get_int("PORT")),
//!     Err(e) => eprintln!("{}", e),
//! }
//! # Ok::<(), envcheck::SchemaError>(())
//! ```
//!
//! A failed check lists every problem:
//!
//! ```text
//! Environment errors (4):
//!   'DATABASE_URL': missing required variable
//!   'DEBUG': missing required variable
//!   [.env:2] 'PORT': expected int, got "eighty": not a base-10 integer
//!   [.env:3] 'USERNAME': value "bad user!" does not match pattern '^[a-zA-Z0-9_]+$'
//! ```
//!
//! # Error Model
//!
//! - Env file missing, unreadable, or malformed: fatal, returned immediately
//!   as [`EnvCheckError::Source`]; no field is validated.
//! - Field problems (missing, wrong type, pattern mismatch): collected across
//!   the whole schema and returned together as [`EnvCheckError::Invalid`].
//!
//! # Architecture
//!
//! "Pure core, imperative shell":
//!
//! - **Pure Core**: [`parse_env_str`] and [`validate`] are pure functions
//! - **Imperative Shell**: [`EnvCheck`] reads through the [`ConfigEnv`] trait
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`check`]: `validate` and the `EnvCheck` builder
//! - [`schema`]: `Schema`, `FieldSpec`, `ConstraintSpec`
//! - [`source`]: `EnvFile` parser and `RawConfig`
//! - [`coerce`]: string to typed value conversion
//! - [`constraint`]: regex `Pattern`
//! - [`error`]: `SourceError`, `SchemaError`, `FieldError`, `ValidationReport`
//! - [`value`]: `TypeKind`, `TypedValue`, `ValidatedConfig`
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//!
//! # Logging
//!
//! Loading and validation emit `tracing` events at `debug` and `trace`
//! level. Nothing is printed unless the application installs a subscriber.

use std::path::Path;

pub mod check;
pub mod coerce;
pub mod constraint;
pub mod env;
pub mod error;
pub mod prelude;
pub mod schema;
pub mod source;
pub mod value;

// Re-exports for convenience
pub use check::{validate, validate_field, EnvCheck};
pub use coerce::{coerce, CoerceError};
pub use constraint::Pattern;
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{
    CheckValidation, CheckValidationExt, EnvCheckError, FieldError, FieldErrorKind, SchemaError,
    SourceError, SourceErrorKind, SourceLocation, ValidationReport,
};
pub use schema::{ConstraintSpec, FieldSpec, Schema};
pub use source::{parse_env_str, EnvFile, RawConfig, RawValue};
pub use value::{TypeKind, TypedValue, UnknownTypeName, ValidatedConfig};

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup, Validation};

/// Validate the env file at `path` against `schema`.
///
/// Reads the file once, then checks every schema field. Returns the typed
/// values, or every field error found.
///
/// # Errors
///
/// - [`EnvCheckError::Source`] if the file is missing, unreadable, or has a
///   malformed line
/// - [`EnvCheckError::Invalid`] with the full report if any field fails
pub fn validate_env(
    path: impl AsRef<Path>,
    schema: &Schema,
) -> Result<ValidatedConfig, EnvCheckError> {
    EnvCheck::new(schema)
        .source(EnvFile::file(path.as_ref()))
        .run()
}
