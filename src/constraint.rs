//! Pattern constraints on raw values.

use std::fmt;

use regex::Regex;

/// A compiled regular expression constraint.
///
/// Matching is find-anywhere: `admin` matches `"the admin user"`. Anchor the
/// pattern with `^...$` to require the whole value to match.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(|regex| Self { regex })
    }

    /// Check whether the raw value satisfies the pattern.
    pub fn matches(&self, raw: &str) -> bool {
        self.regex.is_match(raw)
    }

    /// The pattern as written in the schema.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
