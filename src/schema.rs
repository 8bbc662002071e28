//! Declarative schema of expected variables.
//!
//! A [`Schema`] maps variable names to a [`FieldSpec`]: either a bare
//! [`TypeKind`] or a [`ConstraintSpec`] carrying a pattern, a type, a default
//! and a required flag. Schemas are built in code or loaded from a JSON, TOML
//! or YAML document.
//!
//! # Document format
//!
//! ```json
//! {
//!     "DATABASE_URL": "string",
//!     "DEBUG": "bool",
//!     "PORT": { "type": "int", "default": "5432" },
//!     "USERNAME": { "regex": "^[a-zA-Z0-9_]+$" },
//!     "LOG_LEVEL": { "required": false }
//! }
//! ```
//!
//! Keys other than `type`, `regex`, `required` and `default` are rejected, as
//! are type names other than `string`, `bool`, `int` and `float`.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::constraint::Pattern;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::{EnvCheckError, SchemaError, SourceError};
use crate::value::TypeKind;

/// A type with extra rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSpec {
    /// Raw value must match this pattern (checked before coercion)
    pub pattern: Option<Pattern>,
    /// Type to coerce to
    pub kind: TypeKind,
    /// Raw value used when the variable is absent
    pub default: Option<String>,
    /// Whether an absent variable with no default is an error
    pub required: bool,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        Self {
            pattern: None,
            kind: TypeKind::String,
            default: None,
            required: true,
        }
    }
}

impl ConstraintSpec {
    /// A required `string` with no pattern or default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type to coerce to.
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Compile and attach a pattern.
    pub fn pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.with_pattern(Pattern::new(pattern)?))
    }

    /// Attach an already compiled pattern.
    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Raw value to use when the variable is absent.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Absent variables are skipped instead of reported.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Absent variables are reported (default).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Specification for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Required variable of this type
    Type(TypeKind),
    /// Variable with a pattern, default or optional flag
    Constraint(ConstraintSpec),
}

impl FieldSpec {
    /// The type the value is coerced to.
    pub fn kind(&self) -> TypeKind {
        match self {
            FieldSpec::Type(kind) => *kind,
            FieldSpec::Constraint(spec) => spec.kind,
        }
    }

    /// The pattern the raw value must match, if any.
    pub fn pattern(&self) -> Option<&Pattern> {
        match self {
            FieldSpec::Type(_) => None,
            FieldSpec::Constraint(spec) => spec.pattern.as_ref(),
        }
    }

    /// Raw value used when the variable is absent, if any.
    pub fn default_value(&self) -> Option<&str> {
        match self {
            FieldSpec::Type(_) => None,
            FieldSpec::Constraint(spec) => spec.default.as_deref(),
        }
    }

    /// Whether an absent variable with no default is an error.
    pub fn is_required(&self) -> bool {
        match self {
            FieldSpec::Type(_) => true,
            FieldSpec::Constraint(spec) => spec.required,
        }
    }
}

impl From<TypeKind> for FieldSpec {
    fn from(kind: TypeKind) -> Self {
        FieldSpec::Type(kind)
    }
}

impl From<ConstraintSpec> for FieldSpec {
    fn from(spec: ConstraintSpec) -> Self {
        FieldSpec::Constraint(spec)
    }
}

/// Ordered mapping from variable name to its specification.
///
/// Declaration order is kept and decides the order of reported errors.
///
/// # Example
///
/// ```
/// use envcheck::{ConstraintSpec, Schema, TypeKind};
///
/// let schema = Schema::new()
///     .field("DATABASE_URL", TypeKind::String)
///     .field("DEBUG", TypeKind::Bool)
///     .field("PORT", ConstraintSpec::new().kind(TypeKind::Int).default_value("5432"))
///     .field(
///         "USERNAME",
///         ConstraintSpec::new().pattern("^[a-zA-Z0-9_]+$").unwrap(),
///     );
/// assert_eq!(schema.len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: IndexMap<String, FieldSpec>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style. Re-declaring a name replaces its spec.
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.insert(name, spec);
        self
    }

    /// Add a field in place.
    pub fn insert(&mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) {
        self.fields.insert(name.into(), spec.into());
    }

    /// Look up a field's spec.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Check if a variable is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Load a schema from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, SchemaError> {
        let defs: SchemaDef = serde_json::from_str(content).map_err(format_error)?;
        resolve(defs)
    }

    /// Load a schema from an already parsed JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, SchemaError> {
        let defs: SchemaDef = serde_json::from_value(value).map_err(format_error)?;
        resolve(defs)
    }

    /// Load a schema from a TOML document.
    ///
    /// ```
    /// use envcheck::{Schema, TypeKind};
    ///
    /// let schema = Schema::from_toml_str(r#"
    ///     DATABASE_URL = "string"
    ///     PORT = { type = "int", default = 5432 }
    /// "#).unwrap();
    /// assert_eq!(schema.get("PORT").map(|s| s.kind()), Some(TypeKind::Int));
    /// assert_eq!(schema.get("PORT").and_then(|s| s.default_value()), Some("5432"));
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, SchemaError> {
        let defs: SchemaDef = toml::from_str(content).map_err(format_error)?;
        resolve(defs)
    }

    /// Load a schema from a YAML document.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(content: &str) -> Result<Self, SchemaError> {
        let defs: SchemaDef = serde_yaml::from_str(content).map_err(format_error)?;
        resolve(defs)
    }
}

impl Schema {
    /// Load a schema file from disk. See [`Schema::load`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EnvCheckError> {
        Self::load(path, &RealEnv::new())
    }

    /// Load a schema file through `env`, choosing the format by extension:
    /// `.json`, `.toml` (feature `toml`), `.yaml`/`.yml` (feature `yaml`).
    ///
    /// # Errors
    ///
    /// - [`EnvCheckError::Source`] if the file is missing or unreadable
    /// - [`EnvCheckError::Schema`] if the document is invalid or its format
    ///   is not supported
    pub fn load(path: impl AsRef<Path>, env: &dyn ConfigEnv) -> Result<Self, EnvCheckError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        let content = env
            .read_file(path)
            .map_err(|e| SourceError::from_io(source_name.as_str(), path, &e))?;

        let schema = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml_str(&content)?,
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            _ => return Err(SchemaError::UnsupportedFormat { path: source_name }.into()),
        };

        tracing::debug!(source = %source_name, fields = schema.len(), "loaded schema");
        Ok(schema)
    }
}

impl<N: Into<String>, S: Into<FieldSpec>> FromIterator<(N, S)> for Schema {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, spec) in iter {
            schema.insert(name, spec);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let defs = SchemaDef::deserialize(deserializer)?;
        resolve(defs).map_err(de::Error::custom)
    }
}

// Wire format. Type names and patterns stay strings here and are resolved
// once by `resolve`.

type SchemaDef = IndexMap<String, FieldSpecDef>;

#[derive(Debug)]
enum FieldSpecDef {
    Type(String),
    Constraint(ConstraintDef),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstraintDef {
    #[serde(rename = "type")]
    kind: Option<String>,
    regex: Option<String>,
    required: Option<bool>,
    default: Option<DefaultDef>,
}

/// Defaults are raw strings; scalar booleans and numbers are accepted and
/// stringified so `default = 8080` works in TOML.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultDef {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl DefaultDef {
    fn into_raw(self) -> String {
        match self {
            DefaultDef::String(s) => s,
            DefaultDef::Bool(b) => b.to_string(),
            DefaultDef::Integer(i) => i.to_string(),
            DefaultDef::Float(f) => f.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldSpecDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSpecVisitor;

        impl<'de> Visitor<'de> for FieldSpecVisitor {
            type Value = FieldSpecDef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a type name or a table of type/regex/required/default")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(FieldSpecDef::Type(v.to_string()))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                ConstraintDef::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(FieldSpecDef::Constraint)
            }
        }

        deserializer.deserialize_any(FieldSpecVisitor)
    }
}

fn resolve(defs: SchemaDef) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();

    for (name, def) in defs {
        let spec = match def {
            FieldSpecDef::Type(type_name) => FieldSpec::Type(resolve_kind(&name, type_name)?),
            FieldSpecDef::Constraint(def) => {
                let mut spec = ConstraintSpec::new();
                if let Some(type_name) = def.kind {
                    spec.kind = resolve_kind(&name, type_name)?;
                }
                if let Some(pattern) = def.regex {
                    let compiled =
                        Pattern::new(&pattern).map_err(|e| SchemaError::InvalidPattern {
                            field: name.clone(),
                            pattern: pattern.clone(),
                            message: e.to_string(),
                        })?;
                    spec.pattern = Some(compiled);
                }
                spec.required = def.required.unwrap_or(true);
                spec.default = def.default.map(DefaultDef::into_raw);
                FieldSpec::Constraint(spec)
            }
        };
        schema.insert(name, spec);
    }

    Ok(schema)
}

fn resolve_kind(field: &str, type_name: String) -> Result<TypeKind, SchemaError> {
    match type_name.parse::<TypeKind>() {
        Ok(kind) => Ok(kind),
        Err(_) => Err(SchemaError::UnknownType {
            field: field.to_string(),
            type_name,
        }),
    }
}

fn format_error(e: impl fmt::Display) -> SchemaError {
    SchemaError::Format {
        message: e.to_string(),
    }
}
