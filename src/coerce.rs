//! Type coercion from raw strings to typed values.

use thiserror::Error;

use crate::value::{TypeKind, TypedValue};

/// Case-insensitive spellings accepted as `true`.
pub const TRUE_VALUES: [&str; 4] = ["true", "1", "yes", "on"];

/// Case-insensitive spellings accepted as `false`.
pub const FALSE_VALUES: [&str; 4] = ["false", "0", "no", "off"];

/// Why a raw string could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("not a boolean (expected true/false, 1/0, yes/no or on/off)")]
    InvalidBool,
    #[error("not a base-10 integer")]
    InvalidInt,
    #[error("integer out of range for 64-bit signed")]
    IntOverflow,
    #[error("not a decimal number")]
    InvalidFloat,
    #[error("number is not finite")]
    NonFiniteFloat,
}

/// Coerce a raw string into a value of the given kind.
///
/// `string` is the identity; the other kinds trim surrounding whitespace
/// before parsing.
pub fn coerce(raw: &str, kind: TypeKind) -> Result<TypedValue, CoerceError> {
    match kind {
        TypeKind::String => Ok(TypedValue::String(raw.to_string())),
        TypeKind::Bool => parse_bool(raw).map(TypedValue::Bool),
        TypeKind::Int => parse_int(raw).map(TypedValue::Integer),
        TypeKind::Float => parse_float(raw).map(TypedValue::Float),
    }
}

/// Parse one of the accepted boolean spellings, ignoring case and
/// surrounding whitespace.
pub fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    let raw = raw.trim();
    if TRUE_VALUES.iter().any(|v| raw.eq_ignore_ascii_case(v)) {
        Ok(true)
    } else if FALSE_VALUES.iter().any(|v| raw.eq_ignore_ascii_case(v)) {
        Ok(false)
    } else {
        Err(CoerceError::InvalidBool)
    }
}

/// Parse a base-10 `i64`, reporting overflow separately from bad digits.
pub fn parse_int(raw: &str) -> Result<i64, CoerceError> {
    use std::num::IntErrorKind;

    raw.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => CoerceError::IntOverflow,
        _ => CoerceError::InvalidInt,
    })
}

/// Parse an `f64` in decimal or exponential notation.
///
/// Rejects `inf` and `nan` spellings, and literals such as `1e400` whose
/// magnitude overflows to infinity.
pub fn parse_float(raw: &str) -> Result<f64, CoerceError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| CoerceError::InvalidFloat)?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoerceError::NonFiniteFloat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_string_is_identity() {
        assert_eq!(
            coerce("  spaced  ", TypeKind::String),
            Ok(TypedValue::String("  spaced  ".to_string()))
        );
        assert_eq!(coerce("", TypeKind::String), Ok(TypedValue::String(String::new())));
    }

    #[test]
    fn test_parse_bool_true() {
        for raw in ["true", "TRUE", "True", "1", "yes", "YES", "on", "On", " true "] {
            assert_eq!(parse_bool(raw), Ok(true), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_bool_false() {
        for raw in ["false", "FALSE", "0", "no", "No", "off", "OFF"] {
            assert_eq!(parse_bool(raw), Ok(false), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_bool_rejects_other_strings() {
        for raw in ["", "maybe", "2", "y", "n", "True!", "enabled"] {
            assert_eq!(parse_bool(raw), Err(CoerceError::InvalidBool), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("-10"), Ok(-10));
        assert_eq!(parse_int("+7"), Ok(7));
        assert_eq!(parse_int("  5432  "), Ok(5432));
        assert_eq!(parse_int("9223372036854775807"), Ok(i64::MAX));
        assert_eq!(parse_int("-9223372036854775808"), Ok(i64::MIN));
    }

    #[test]
    fn test_parse_int_rejects_non_numeric() {
        for raw in ["", "abc", "12abc", "1.5", "0x10", "1_000"] {
            assert_eq!(parse_int(raw), Err(CoerceError::InvalidInt), "{:?}", raw);
        }
    }

    #[test]
    fn test_parse_int_overflow() {
        assert_eq!(parse_int("9223372036854775808"), Err(CoerceError::IntOverflow));
        assert_eq!(parse_int("-9223372036854775809"), Err(CoerceError::IntOverflow));
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("3.25"), Ok(3.25));
        assert_eq!(parse_float("-2.5"), Ok(-2.5));
        assert_eq!(parse_float("10"), Ok(10.0));
        assert_eq!(parse_float(" .5 "), Ok(0.5));
        assert_eq!(parse_float("1.5e10"), Ok(1.5e10));
        assert_eq!(parse_float("2E-3"), Ok(0.002));
    }

    #[test]
    fn test_parse_float_rejects_bad_input() {
        assert_eq!(parse_float("abc"), Err(CoerceError::InvalidFloat));
        assert_eq!(parse_float(""), Err(CoerceError::InvalidFloat));
        assert_eq!(parse_float("1.2.3"), Err(CoerceError::InvalidFloat));
        assert_eq!(parse_float("inf"), Err(CoerceError::NonFiniteFloat));
        assert_eq!(parse_float("NaN"), Err(CoerceError::NonFiniteFloat));
        assert_eq!(parse_float("1e400"), Err(CoerceError::NonFiniteFloat));
        assert_eq!(parse_float("-1e400"), Err(CoerceError::NonFiniteFloat));
    }

    #[test]
    fn test_coerce_dispatches_on_kind() {
        assert_eq!(coerce("yes", TypeKind::Bool), Ok(TypedValue::Bool(true)));
        assert_eq!(coerce("5432", TypeKind::Int), Ok(TypedValue::Integer(5432)));
        assert_eq!(coerce("0.5", TypeKind::Float), Ok(TypedValue::Float(0.5)));
        assert_eq!(coerce("abc", TypeKind::Int), Err(CoerceError::InvalidInt));
    }
}
