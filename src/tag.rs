//! YAML tags.
//!
//! Short forms of the core schema tags, plus resolution of plain
//! (untagged, unquoted) scalars following the YAML 1.2 core schema:
//!
//! - `null`: `~`, `null`, `Null`, `NULL` or empty
//! - `bool`: `true`/`false` in lower, title or upper case
//! - `int`: decimal, `0o` octal or `0x` hexadecimal
//! - `float`: decimal with fraction and/or exponent, `.inf`, `.nan`
//! - anything else is a `str`

use regex::Regex;
use std::sync::LazyLock;

pub const STR: &str = "!!str";
pub const INT: &str = "!!int";
pub const FLOAT: &str = "!!float";
pub const BOOL: &str = "!!bool";
pub const NULL: &str = "!!null";
pub const MAP: &str = "!!map";
pub const SEQ: &str = "!!seq";
pub const MERGE: &str = "!!merge";

const LONG_PREFIX: &str = "tag:yaml.org,2002:";

static NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(~|null|Null|NULL|)$").expect("valid null regex"));
static BOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(true|True|TRUE|false|False|FALSE)$").expect("valid bool regex")
});
static INT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([-+]?[0-9]+|0o[0-7]+|0x[0-9a-fA-F]+)$").expect("valid int regex")
});
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?|[-+]?\.(inf|Inf|INF)|\.(nan|NaN|NAN))$",
    )
    .expect("valid float regex")
});

/// Tag a plain scalar would resolve to.
///
/// ```
/// use yaml_walk::tag;
///
/// assert_eq!(tag::resolve("42"), tag::INT);
/// assert_eq!(tag::resolve("4.2e1"), tag::FLOAT);
/// assert_eq!(tag::resolve("~"), tag::NULL);
/// assert_eq!(tag::resolve("yes"), tag::STR);
/// ```
pub fn resolve(value: &str) -> &'static str {
    if NULL_RE.is_match(value) {
        NULL
    } else if BOOL_RE.is_match(value) {
        BOOL
    } else if INT_RE.is_match(value) {
        INT
    } else if FLOAT_RE.is_match(value) {
        FLOAT
    } else {
        STR
    }
}

/// Bring a tag to its short form.
///
/// `tag:yaml.org,2002:str` becomes `!!str`, a bare `custom` becomes
/// `!custom`, already prefixed tags are kept.
pub fn normalize(tag: &str) -> String {
    let tag = tag.trim();
    if let Some(name) = tag.strip_prefix(LONG_PREFIX) {
        return format!("!!{}", name);
    }
    if tag.is_empty() || tag.starts_with('!') {
        return tag.to_string();
    }
    format!("!{}", tag)
}

/// True for tags of the core schema (`!!str`, `!!map`, ...).
pub fn is_core(tag: &str) -> bool {
    matches!(tag, STR | INT | FLOAT | BOOL | NULL | MAP | SEQ | MERGE)
}

/// Parse an integer scalar, including `0o` and `0x` forms.
pub fn parse_int(value: &str) -> Option<i64> {
    let value = value.strip_prefix('+').unwrap_or(value);
    if let Some(oct) = value.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok();
    }
    if let Some(hex) = value.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok();
    }
    value.parse().ok()
}

/// Parse a float scalar, including `.inf` and `.nan` forms.
pub fn parse_float(value: &str) -> Option<f64> {
    match value.to_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

/// Scalar text of a float, using YAML spellings for special values.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else {
        value.to_string()
    }
}
