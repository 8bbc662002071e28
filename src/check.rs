//! Schema validation and the `EnvCheck` builder.
//!
//! [`validate`] is the pure core: it walks the schema in declaration order,
//! resolves each variable from the [`RawConfig`], coerces it and checks its
//! pattern, collecting every failure. [`EnvCheck`] is the shell around it that
//! loads the env file and the process environment through [`ConfigEnv`].

use stillwater::Validation;

use crate::coerce::coerce;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::{
    CheckValidation, CheckValidationExt, EnvCheckError, FieldError, SourceError, SourceLocation,
};
use crate::schema::{FieldSpec, Schema};
use crate::source::{EnvFile, RawConfig, RawValue};
use crate::value::{TypedValue, ValidatedConfig};

/// Validate raw values against a schema.
///
/// Every schema field is checked; errors are accumulated rather than
/// returned on the first failure. Variables not declared in the schema are
/// ignored.
///
/// # Example
///
/// ```
/// use envcheck::{parse_env_str, validate, Schema, TypeKind, Validation};
///
/// let schema = Schema::new()
///     .field("PORT", TypeKind::Int)
///     .field("DEBUG", TypeKind::Bool);
/// let raw = parse_env_str("PORT=abc\nDEBUG=maybe\n", ".env").unwrap();
///
/// match validate(&raw, &schema) {
///     Validation::Failure(report) => assert_eq!(report.len(), 2),
///     Validation::Success(_) => unreachable!(),
/// }
/// ```
pub fn validate(raw: &RawConfig, schema: &Schema) -> CheckValidation<ValidatedConfig> {
    let validations: Vec<CheckValidation<Option<(String, TypedValue)>>> = schema
        .iter()
        .map(|(name, spec)| {
            validate_field(name, spec, raw.get(name))
                .map(|value| value.map(|v| (name.to_string(), v)))
        })
        .collect();

    let result = Validation::all_vec(validations).map(|resolved| {
        let mut config = ValidatedConfig::new();
        for (name, value) in resolved.into_iter().flatten() {
            config.insert(name, value);
        }
        config
    });

    match &result {
        Validation::Success(config) => {
            tracing::debug!(fields = schema.len(), resolved = config.len(), "env check passed");
        }
        Validation::Failure(report) => {
            tracing::debug!(fields = schema.len(), errors = report.len(), "env check failed");
        }
    }

    result
}

/// Validate a single schema field.
///
/// Succeeds with `None` when an optional variable is absent. A value that
/// fails coercion reports only the type error; the pattern is checked against
/// values that coerced.
pub fn validate_field(
    name: &str,
    spec: &FieldSpec,
    raw: Option<&RawValue>,
) -> CheckValidation<Option<TypedValue>> {
    let defaulted;
    let raw = match (raw, spec.default_value()) {
        (Some(raw), _) => raw,
        (None, Some(default)) => {
            defaulted = RawValue::new(default, SourceLocation::schema_default());
            &defaulted
        }
        (None, None) if !spec.is_required() => {
            tracing::trace!(field = name, "optional variable absent");
            return Validation::Success(None);
        }
        (None, None) => return CheckValidation::fail_with(FieldError::missing(name)),
    };

    let kind = spec.kind();

    let value = match coerce(&raw.value, kind) {
        Ok(value) => value,
        Err(e) => {
            // the pattern is not checked once coercion has failed
            return CheckValidation::fail_with(
                FieldError::type_mismatch(name, kind, raw.value.as_str(), e.to_string())
                    .at(raw.source.clone()),
            );
        }
    };

    if let Some(pattern) = spec.pattern() {
        if !pattern.matches(&raw.value) {
            return CheckValidation::fail_with(
                FieldError::pattern_mismatch(name, pattern.as_str(), raw.value.as_str())
                    .at(raw.source.clone()),
            );
        }
    }

    tracing::trace!(field = name, source = %raw.source, %kind, "variable resolved");
    Validation::Success(Some(value))
}

/// Builder for a one-shot environment check.
///
/// # Example
///
/// ```
/// use envcheck::{EnvCheck, EnvFile, MockEnv, Schema, TypeKind};
///
/// let schema = Schema::new()
///     .field("DATABASE_URL", TypeKind::String)
///     .field("PORT", TypeKind::Int);
///
/// let env = MockEnv::new()
///     .with_file(".env", "DATABASE_URL=postgres://localhost/db\n")
///     .with_env("PORT", "5432");
///
/// let config = EnvCheck::new(&schema)
///     .source(EnvFile::file(".env"))
///     .system_env()
///     .run_with_env(&env)
///     .unwrap();
/// assert_eq!(config.get_int("PORT"), Some(5432));
/// ```
#[derive(Debug, Clone)]
pub struct EnvCheck<'a> {
    schema: &'a Schema,
    source: Option<EnvFile>,
    system_env: bool,
}

impl<'a> EnvCheck<'a> {
    /// Start a check against `schema`.
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            source: None,
            system_env: false,
        }
    }

    /// Set the env file to read. A later call replaces the earlier one.
    pub fn source(mut self, source: EnvFile) -> Self {
        self.source = Some(source);
        self
    }

    /// Look up variables missing from the env file in the process environment.
    ///
    /// Env file values win over the process environment, which wins over
    /// schema defaults.
    pub fn system_env(mut self) -> Self {
        self.system_env = true;
        self
    }

    /// Run the check using the real file system and process environment.
    pub fn run(self) -> Result<ValidatedConfig, EnvCheckError> {
        self.run_with_env(&RealEnv::new())
    }

    /// Run the check with a custom environment.
    pub fn run_with_env(self, env: &dyn ConfigEnv) -> Result<ValidatedConfig, EnvCheckError> {
        let raw = self.load_raw(env)?;

        match validate(&raw, self.schema) {
            Validation::Success(config) => Ok(config),
            Validation::Failure(report) => Err(EnvCheckError::Invalid(report)),
        }
    }

    /// Load raw values without validating them.
    ///
    /// Parse failures are fatal and abort before any field is checked.
    pub fn load_raw(&self, env: &dyn ConfigEnv) -> Result<RawConfig, SourceError> {
        let mut raw = match &self.source {
            Some(source) => source.load(env)?,
            None => RawConfig::empty(),
        };

        if self.system_env {
            fill_from_env(&mut raw, self.schema, env);
        }

        Ok(raw)
    }
}

/// Fill schema variables absent from `raw` with process environment values.
fn fill_from_env(raw: &mut RawConfig, schema: &Schema, env: &dyn ConfigEnv) {
    let mut filled = 0usize;

    for name in schema.names() {
        if raw.contains(name) {
            continue;
        }
        if let Some(value) = env.get_env(name) {
            raw.insert(name, RawValue::new(value, SourceLocation::env(name)));
            filled += 1;
        }
    }

    tracing::debug!(filled, "filled variables from process environment");
}
