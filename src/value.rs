//! Value types for validated configuration.
//!
//! [`TypeKind`] names the primitive types a schema field can declare,
//! [`TypedValue`] holds a coerced value, and [`ValidatedConfig`] is the final
//! name-to-value mapping handed back to the caller.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Primitive type a schema field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeKind {
    #[default]
    String,
    Bool,
    Int,
    Float,
}

impl TypeKind {
    /// The schema spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type name that is not one of `string`, `bool`, `int`, `float`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type '{0}'")]
pub struct UnknownTypeName(pub String);

impl FromStr for TypeKind {
    type Err = UnknownTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(TypeKind::String),
            "bool" => Ok(TypeKind::Bool),
            "int" => Ok(TypeKind::Int),
            "float" => Ok(TypeKind::Float),
            other => Err(UnknownTypeName(other.to_string())),
        }
    }
}

/// A coerced configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl TypedValue {
    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The declared type this value was coerced to.
    pub fn kind(&self) -> TypeKind {
        match self {
            TypedValue::String(_) => TypeKind::String,
            TypedValue::Bool(_) => TypeKind::Bool,
            TypedValue::Integer(_) => TypeKind::Int,
            TypedValue::Float(_) => TypeKind::Float,
        }
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TypedValue::String(s) => serde_json::Value::String(s.clone()),
            TypedValue::Bool(b) => serde_json::Value::Bool(*b),
            TypedValue::Integer(i) => serde_json::Value::Number((*i).into()),
            TypedValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for TypedValue {
    fn from(b: bool) -> Self {
        TypedValue::Bool(b)
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        TypedValue::Integer(i)
    }
}

impl From<f64> for TypedValue {
    fn from(f: f64) -> Self {
        TypedValue::Float(f)
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        TypedValue::String(s)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        TypedValue::String(s.to_string())
    }
}

/// The result of a successful check: every resolved schema variable mapped to
/// its typed value, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedConfig {
    values: IndexMap<String, TypedValue>,
}

impl ValidatedConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: TypedValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a value by variable name.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values.get(name)
    }

    /// Get a `string` value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TypedValue::as_str)
    }

    /// Get a `bool` value.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(TypedValue::as_bool)
    }

    /// Get an `int` value.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(TypedValue::as_integer)
    }

    /// Get a `float` value.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(TypedValue::as_float)
    }

    /// Check if a variable resolved.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of resolved variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over name-value pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Variable names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Consume into the underlying ordered map.
    pub fn into_inner(self) -> IndexMap<String, TypedValue> {
        self.values
    }

    /// Render as a flat JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl IntoIterator for ValidatedConfig {
    type Item = (String, TypedValue);
    type IntoIter = indexmap::map::IntoIter<String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
