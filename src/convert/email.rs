//! Email normalization and name splitting.
//!
//! Stargazer-sourced emails carry common obfuscations: bracketed "at"/"dot"
//! markers, stray `#` in place of `@`, and a missing `@` before well-known
//! mail-provider domains. The substitutions run in a fixed order and are
//! case-insensitive.

use regex::Regex;
use std::sync::LazyLock;

static AT_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:\[at\]|\(at\))\s*").expect("valid regex"));
static AT_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+at\s+").expect("valid regex"));
static DOT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\[dot\]\s*").expect("valid regex"));
static DOT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+dot\s+").expect("valid regex"));

/// Provider domains that get an inserted `@` when glued to the local part.
/// Only exact end-of-string suffix matches qualify; an existing `@` before
/// the domain never matches `[a-z0-9]`, so valid addresses pass through.
const PROVIDER_DOMAINS: [&str; 7] = [
    "gmail.com",
    "outlook.com",
    "yahoo.com",
    "hotmail.com",
    "163.com",
    "126.com",
    "qq.com",
];

static PROVIDER_FIXES: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    PROVIDER_DOMAINS
        .iter()
        .map(|domain| {
            let pattern = format!(r"(?i)([a-z0-9]){}$", regex::escape(domain));
            let replacement = format!("${{1}}@{domain}");
            (Regex::new(&pattern).expect("valid regex"), replacement)
        })
        .collect()
});

/// Normalize an email address by converting common anomalies to proper form.
pub fn normalize_email(email: &str) -> String {
    if email.is_empty() {
        return String::new();
    }

    let mut result = AT_MARKERS.replace_all(email, "@").into_owned();
    result = AT_WORD.replace_all(&result, "@").into_owned();
    result = DOT_MARKER.replace_all(&result, ".").into_owned();
    result = DOT_WORD.replace_all(&result, ".").into_owned();
    result = result.replace('#', "@");

    for (pattern, replacement) in PROVIDER_FIXES.iter() {
        result = pattern.replace(&result, replacement.as_str()).into_owned();
    }

    result
}

/// Split a display name into (first name, last name).
///
/// The first whitespace-separated token is the first name; the remainder,
/// joined by single spaces, is the last name. An empty name yields two
/// empty strings.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}
