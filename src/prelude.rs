//! Convenient re-exports for common envcheck usage.
//!
//! ```
//! use envcheck::prelude::*;
//!
//! let schema = Schema::new()
//!     .field("PORT", TypeKind::Int)
//!     .field("DEBUG", TypeKind::Bool);
//! let env = MockEnv::new().with_file(".env", "PORT=8080\nDEBUG=off\n");
//!
//! let config = EnvCheck::new(&schema)
//!     .source(EnvFile::file(".env"))
//!     .run_with_env(&env)
//!     .unwrap();
//! assert_eq!(config.get_bool("DEBUG"), Some(false));
//! ```

// ============================================================================
// Stillwater re-exports
// ============================================================================

/// Result type with error accumulation, returned by [`validate`].
pub use stillwater::Validation;

/// Trait for combining values. `ValidationReport` implements this.
pub use stillwater::Semigroup;

/// Guaranteed non-empty collection. Underlying type for `ValidationReport`.
pub use stillwater::NonEmptyVec;

// ============================================================================
// Error types
// ============================================================================

/// Top-level error: a fatal source or schema error, or a failed validation.
pub use crate::error::EnvCheckError;

/// A single failing field.
pub use crate::error::FieldError;

/// What went wrong with a field.
pub use crate::error::FieldErrorKind;

/// Every field error from one pass. Implements `Semigroup` for accumulation.
pub use crate::error::ValidationReport;

/// Type alias: `Validation<T, ValidationReport>`.
pub use crate::error::CheckValidation;

/// Extension trait for creating failing validations easily.
pub use crate::error::CheckValidationExt;

/// Fatal env file errors.
pub use crate::error::{SourceError, SourceErrorKind};

/// Broken schema.
pub use crate::error::SchemaError;

/// Location where a raw value originated.
pub use crate::error::SourceLocation;

// ============================================================================
// Schema and values
// ============================================================================

pub use crate::schema::{ConstraintSpec, FieldSpec, Schema};

pub use crate::constraint::Pattern;

pub use crate::value::{TypeKind, TypedValue, ValidatedConfig};

// ============================================================================
// Sources and checking
// ============================================================================

pub use crate::source::{parse_env_str, EnvFile, RawConfig, RawValue};

pub use crate::check::{validate, EnvCheck};

pub use crate::validate_env;

// ============================================================================
// Environment abstractions
// ============================================================================

/// Trait for abstracting I/O operations.
pub use crate::env::ConfigEnv;

/// Real environment implementation for production use.
pub use crate::env::RealEnv;

/// Mock environment for testing.
pub use crate::env::MockEnv;
