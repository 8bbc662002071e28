//! Env file source and raw value storage.
//!
//! [`EnvFile`] loads `KEY=VALUE` text from a file or string and parses it into
//! a [`RawConfig`]: an ordered map from variable name to the raw string and
//! the place it came from.
//!
//! # Grammar
//!
//! ```text
//! # comment
//! export DATABASE_URL=postgres://localhost/db
//! GREETING="say \"hi\""
//! RAW='no $escapes here'
//! PORT = 5432
//! ```
//!
//! - blank lines and `#` comment lines are skipped
//! - an `export ` prefix is stripped
//! - keys match `[A-Za-z_][A-Za-z0-9_]*`
//! - double-quoted values unescape `\"` and `\\`; single-quoted values are literal
//! - a quoted value may be followed by a `# comment`; a value with an
//!   unmatched quote is kept verbatim
//! - unquoted values are trimmed and kept verbatim, including any `#`
//! - any other line fails the whole parse
//! - a leading UTF-8 byte-order mark is ignored

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::env::ConfigEnv;
use crate::error::{SourceError, SourceErrorKind, SourceLocation};

/// A raw string value with source tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// The value as written, with quotes removed
    pub value: String,
    /// Where this value came from
    pub source: SourceLocation,
}

impl RawValue {
    /// Create a new raw value with source tracking.
    pub fn new(value: impl Into<String>, source: SourceLocation) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }
}

/// Ordered mapping from variable name to raw value.
///
/// Inserting an existing name replaces its value but keeps the position of
/// the first occurrence (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawConfig {
    values: IndexMap<String, RawValue>,
}

impl RawConfig {
    /// Create an empty RawConfig container.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a value under the given name.
    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a value by name.
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    /// Get just the raw string for a name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.value.as_str())
    }

    /// Check if a name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Get the number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over name-value pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.values.iter()
    }

    /// Get all names in file order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

impl FromIterator<(String, RawValue)> for RawConfig {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        let mut raw = RawConfig::empty();
        for (name, value) in iter {
            raw.insert(name, value);
        }
        raw
    }
}

#[derive(Debug, Clone)]
enum EnvFileSource {
    /// Load from a file path
    File(PathBuf),
    /// Load from a string
    String { content: String, name: String },
}

/// Env file source.
///
/// # Example
///
/// ```
/// use envcheck::{EnvFile, MockEnv};
///
/// let env = MockEnv::new().with_file(".env", "PORT=8080\n");
/// let raw = EnvFile::file(".env").load(&env).unwrap();
/// assert_eq!(raw.get_str("PORT"), Some("8080"));
///
/// // A missing optional file loads as empty
/// let raw = EnvFile::file(".env.local").optional().load(&env).unwrap();
/// assert!(raw.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct EnvFile {
    source: EnvFileSource,
    required: bool,
    name: Option<String>,
}

impl EnvFile {
    /// Load from a file path (required by default).
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: EnvFileSource::File(path.into()),
            required: true,
            name: None,
        }
    }

    /// Load from in-memory content.
    pub fn string(content: impl Into<String>) -> Self {
        Self {
            source: EnvFileSource::String {
                content: content.into(),
                name: "<string>".to_string(),
            },
            required: true,
            name: None,
        }
    }

    /// Mark this source as optional (a missing file loads as empty).
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark this source as required (default).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a custom name for this source in error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the source name for error messages.
    pub fn source_name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }

        match &self.source {
            EnvFileSource::File(path) => path.display().to_string(),
            EnvFileSource::String { name, .. } => name.clone(),
        }
    }

    /// Load and parse the env file.
    ///
    /// File I/O goes through `ConfigEnv`; parsing is pure and happens after
    /// the read completes.
    pub fn load(&self, env: &dyn ConfigEnv) -> Result<RawConfig, SourceError> {
        let source_name = self.source_name();

        let content = match &self.source {
            EnvFileSource::File(path) => match env.read_file(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
                    tracing::debug!(source = %source_name, "optional env file not found");
                    return Ok(RawConfig::empty());
                }
                Err(e) => return Err(SourceError::from_io(source_name, path, &e)),
            },
            EnvFileSource::String { content, .. } => content.clone(),
        };

        let raw = parse_env_str(&content, &source_name)?;
        tracing::debug!(source = %source_name, entries = raw.len(), "loaded env file");
        Ok(raw)
    }
}

/// Parse env file content into a RawConfig.
///
/// Stops at the first malformed line.
pub fn parse_env_str(content: &str, source_name: &str) -> Result<RawConfig, SourceError> {
    let mut raw = RawConfig::empty();
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);

    // `lines()` also drops the `\r` of CRLF line endings.
    for (idx, line) in content.lines().enumerate() {
        let line_no = u32::try_from(idx + 1).unwrap_or(u32::MAX);

        match parse_line(line) {
            Some(Line::Skip) => {}
            Some(Line::Entry { key, value }) => {
                let location = SourceLocation::new(source_name).with_line(line_no);
                raw.insert(key, RawValue::new(value, location));
            }
            None => {
                return Err(SourceError::new(
                    source_name,
                    SourceErrorKind::ParseError {
                        line: line_no,
                        content: line.to_string(),
                    },
                ));
            }
        }
    }

    Ok(raw)
}

enum Line<'a> {
    Skip,
    Entry { key: &'a str, value: String },
}

/// Parse a single line; `None` means the line is malformed.
fn parse_line(line: &str) -> Option<Line<'_>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Some(Line::Skip);
    }

    let rest = trimmed
        .strip_prefix("export ")
        .map(str::trim_start)
        .unwrap_or(trimmed);

    let (key, value) = rest.split_once('=')?;
    let key = key.trim_end();
    if !is_valid_key(key) {
        return None;
    }

    Some(Line::Entry {
        key,
        value: parse_value(value),
    })
}

/// Keys match `[A-Za-z_][A-Za-z0-9_]*`.
fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Resolve a value: a clean quoted token (optionally followed by a `#`
/// comment), else a value wrapped in matching quotes, else the trimmed text.
fn parse_value(value: &str) -> String {
    let value = value.trim();

    if let Some(body) = value.strip_prefix('"') {
        if let Some((unquoted, rest)) = parse_double_quoted(body) {
            if trailing_is_empty(rest) {
                return unquoted;
            }
        }
        if let Some(inner) = body.strip_suffix('"') {
            return unescape_double(inner);
        }
    }

    if let Some(body) = value.strip_prefix('\'') {
        if let Some(end) = body.find('\'') {
            if trailing_is_empty(&body[end + 1..]) {
                return body[..end].to_string();
            }
        }
        if let Some(inner) = body.strip_suffix('\'') {
            return inner.to_string();
        }
    }

    value.to_string()
}

/// Scan a double-quoted body up to its closing quote.
///
/// Returns the unescaped value and whatever follows the closing quote.
fn parse_double_quoted(body: &str) -> Option<(String, &str)> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &body[i + 1..])),
            '\\' => match chars.next() {
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            other => out.push(other),
        }
    }

    // unterminated
    None
}

/// Unescape `\"` and `\\` in the body of a wrapped double-quoted value.
fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match (c, chars.clone().next()) {
            ('\\', Some(next @ ('"' | '\\'))) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(c),
        }
    }

    out
}

/// After a closing quote only whitespace or a `#` comment may follow.
fn trailing_is_empty(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.is_empty() || rest.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;

    fn parse(content: &str) -> RawConfig {
        parse_env_str(content, ".env").expect("should parse")
    }

    fn parse_err(content: &str) -> SourceError {
        parse_env_str(content, ".env").expect_err("should fail")
    }

    #[test]
    fn test_parse_basic() {
        let raw = parse("DATABASE_URL=postgres://localhost/db\nDEBUG=true\nPORT=5432\n");

        assert_eq!(raw.len(), 3);
        assert_eq!(raw.get_str("DATABASE_URL"), Some("postgres://localhost/db"));
        assert_eq!(raw.get_str("DEBUG"), Some("true"));
        assert_eq!(raw.get_str("PORT"), Some("5432"));
    }

    #[test]
    fn test_parse_tracks_line_numbers() {
        let raw = parse("# header\n\nHOST=localhost\nPORT=80");

        let host = raw.get("HOST").unwrap();
        assert_eq!(host.source.source, ".env");
        assert_eq!(host.source.line, Some(3));
        assert_eq!(raw.get("PORT").unwrap().source.line, Some(4));
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let raw = parse("\n   \n# comment\n   # indented comment\nA=1\n\t\n");
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.get_str("A"), Some("1"));
    }

    #[test]
    fn test_parse_export_prefix() {
        let raw = parse("export HOST=localhost\n  export   PORT=80");
        assert_eq!(raw.get_str("HOST"), Some("localhost"));
        assert_eq!(raw.get_str("PORT"), Some("80"));
    }

    #[test]
    fn test_parse_key_named_export() {
        let raw = parse("export=yes");
        assert_eq!(raw.get_str("export"), Some("yes"));
    }

    #[test]
    fn test_parse_value_after_first_equals() {
        let raw = parse("URL=postgres://u:p@h/db?sslmode=require");
        assert_eq!(raw.get_str("URL"), Some("postgres://u:p@h/db?sslmode=require"));
    }

    #[test]
    fn test_parse_trims_unquoted_value_and_key() {
        let raw = parse("NAME =   spaced out   ");
        assert_eq!(raw.get_str("NAME"), Some("spaced out"));
    }

    #[test]
    fn test_parse_empty_value() {
        let raw = parse("EMPTY=\nQUOTED=\"\"");
        assert_eq!(raw.get_str("EMPTY"), Some(""));
        assert_eq!(raw.get_str("QUOTED"), Some(""));
    }

    #[test]
    fn test_parse_keeps_inline_comment_on_unquoted_value() {
        let raw = parse("PORT=5432 # database port");
        assert_eq!(raw.get_str("PORT"), Some("5432 # database port"));
    }

    #[test]
    fn test_parse_double_quoted() {
        let raw = parse(r#"GREETING="  hello world  ""#);
        assert_eq!(raw.get_str("GREETING"), Some("  hello world  "));
    }

    #[test]
    fn test_parse_double_quoted_escapes() {
        let raw = parse(r#"MSG="say \"hi\" to C:\\temp and \n stays""#);
        assert_eq!(raw.get_str("MSG"), Some(r#"say "hi" to C:\temp and \n stays"#));
    }

    #[test]
    fn test_parse_single_quoted_is_literal() {
        let raw = parse(r#"RAW='no \"escapes\" here'"#);
        assert_eq!(raw.get_str("RAW"), Some(r#"no \"escapes\" here"#));
    }

    #[test]
    fn test_parse_quoted_value_with_trailing_comment() {
        let raw = parse("NAME=\"admin\"   # the admin user");
        assert_eq!(raw.get_str("NAME"), Some("admin"));
    }

    #[test]
    fn test_parse_quoted_value_with_hash_inside() {
        let raw = parse("COLOR='#ff0000'");
        assert_eq!(raw.get_str("COLOR"), Some("#ff0000"));
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let raw = parse("A=1\r\nB=\"two\"\r\n");
        assert_eq!(raw.get_str("A"), Some("1"));
        assert_eq!(raw.get_str("B"), Some("two"));
    }

    #[test]
    fn test_parse_duplicate_keys_last_write_wins() {
        let raw = parse("A=first\nB=b\nA=second");
        assert_eq!(raw.get_str("A"), Some("second"));
        assert_eq!(raw.get("A").unwrap().source.line, Some(3));
        // first-occurrence position is kept
        assert_eq!(raw.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_parse_error_no_equals() {
        let err = parse_err("NOEQUALSSIGN");
        assert_eq!(
            err.kind,
            SourceErrorKind::ParseError {
                line: 1,
                content: "NOEQUALSSIGN".to_string(),
            }
        );
        assert_eq!(err.source_name, ".env");
    }

    #[test]
    fn test_parse_error_reports_offending_line() {
        let err = parse_err("A=1\n# ok\nnot valid\nB=2");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_parse_error_invalid_keys() {
        for line in ["1ABC=x", "MY-KEY=x", "=value", "MY KEY=x", "KÉY=x"] {
            let err = parse_err(line);
            assert_eq!(err.line(), Some(1), "expected parse error for {:?}", line);
        }
    }

    #[test]
    fn test_parse_unterminated_quote_is_verbatim() {
        let raw = parse("A=\"'\nB='\nC=\"open\nD='open\n");
        assert_eq!(raw.get_str("A"), Some("\"'"));
        assert_eq!(raw.get_str("B"), Some("'"));
        assert_eq!(raw.get_str("C"), Some("\"open"));
        assert_eq!(raw.get_str("D"), Some("'open"));
    }

    #[test]
    fn test_parse_wrapped_value_with_inner_quote() {
        let raw = parse("A=\"x\"y\"\nB='it's'\nC=\"a\\\"b\"c\"");
        assert_eq!(raw.get_str("A"), Some("x\"y"));
        assert_eq!(raw.get_str("B"), Some("it's"));
        assert_eq!(raw.get_str("C"), Some("a\"b\"c"));
    }

    #[test]
    fn test_parse_text_after_closing_quote_is_verbatim() {
        let raw = parse("A=\"quoted\"tail\nB='quoted' tail\nC=\"v\" # note\n");
        assert_eq!(raw.get_str("A"), Some("\"quoted\"tail"));
        assert_eq!(raw.get_str("B"), Some("'quoted' tail"));
        assert_eq!(raw.get_str("C"), Some("v"));
    }

    #[test]
    fn test_parse_strips_byte_order_mark() {
        let raw = parse("\u{FEFF}PORT=1\nHOST=localhost\n");
        assert_eq!(raw.names().collect::<Vec<_>>(), vec!["PORT", "HOST"]);
        assert_eq!(raw.get("PORT").unwrap().source.line, Some(1));
    }

    #[test]
    fn test_parse_byte_order_mark_only_at_start() {
        assert_eq!(parse_err("PORT=1\n\u{FEFF}HOST=x\n").line(), Some(2));
    }

    #[test]
    fn test_parse_mismatched_quote_is_unquoted() {
        let raw = parse("A=value\"");
        assert_eq!(raw.get_str("A"), Some("value\""));
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("A"));
        assert!(is_valid_key("_PRIVATE"));
        assert!(is_valid_key("snake_case_9"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("9LIVES"));
        assert!(!is_valid_key("DOT.TED"));
    }

    #[test]
    fn test_env_file_load_from_mock() {
        let env = MockEnv::new().with_file(".env", "HOST=localhost\n");
        let raw = EnvFile::file(".env").load(&env).unwrap();
        assert_eq!(raw.get_str("HOST"), Some("localhost"));
    }

    #[test]
    fn test_env_file_required_missing() {
        let env = MockEnv::new();
        let err = EnvFile::file(".env").load(&env).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.kind,
            SourceErrorKind::NotFound {
                path: ".env".to_string()
            }
        );
    }

    #[test]
    fn test_env_file_optional_missing() {
        let env = MockEnv::new();
        let raw = EnvFile::file(".env").optional().load(&env).unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn test_env_file_optional_still_reports_parse_errors() {
        let env = MockEnv::new().with_file(".env", "broken");
        let err = EnvFile::file(".env").optional().load(&env).unwrap_err();
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_env_file_unreadable() {
        let env = MockEnv::new().with_unreadable_file(".env");
        let err = EnvFile::file(".env").optional().load(&env).unwrap_err();
        assert!(matches!(err.kind, SourceErrorKind::IoError { .. }));
    }

    #[test]
    fn test_env_file_string_and_named() {
        let env = MockEnv::new();
        let source = EnvFile::string("A=1").named("inline");
        assert_eq!(source.source_name(), "inline");

        let raw = source.load(&env).unwrap();
        assert_eq!(raw.get("A").unwrap().source.source, "inline");
        assert_eq!(EnvFile::string("A=1").source_name(), "<string>");
    }

    #[test]
    fn test_raw_config_from_iter() {
        let raw: RawConfig = vec![
            ("A".to_string(), RawValue::new("1", SourceLocation::new("x"))),
            ("A".to_string(), RawValue::new("2", SourceLocation::new("y"))),
        ]
        .into_iter()
        .collect();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.get_str("A"), Some("2"));
    }
}
