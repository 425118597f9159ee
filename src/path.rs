//! Language-country prefix parsing.
//!
//! A path carries a negotiation signal only when its first segment, after
//! trimming slashes and URL-decoding, is exactly `xx-yy`: two lowercase ASCII
//! letters for the langcode, a dash, two lowercase ASCII letters for the
//! country code. No other segment is ever inspected.

use regex::Regex;
use std::sync::OnceLock;

/// Pattern a first path segment has to match to count as a prefix.
pub const LANGUAGE_COUNTRY_PATTERN: &str = r"^[a-z]{2}-[a-z]{2}$";

static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();

fn prefix_regex() -> &'static Regex {
    PREFIX_REGEX.get_or_init(|| {
        Regex::new(LANGUAGE_COUNTRY_PATTERN).expect("Prefix pattern should compile")
    })
}

/// Get the `xx-yy` prefix of a path, if it has a valid one.
pub fn valid_prefix(path: &str) -> Option<String> {
    let decoded = url_decode(path.trim_matches('/'));
    let first = decoded.split('/').next().unwrap_or_default();
    if prefix_regex().is_match(first) {
        Some(first.to_string())
    } else {
        None
    }
}

/// Check whether the first path segment is a language-country prefix.
pub fn has_valid_prefix(path: &str) -> bool {
    valid_prefix(path).is_some()
}

/// Get the langcode part (`xx`) of a valid prefix.
pub fn langcode_from_path(path: &str) -> Option<String> {
    valid_prefix(path).map(|prefix| prefix[..2].to_string())
}

/// Get the country code part (`yy`) of a valid prefix.
pub fn country_code_from_path(path: &str) -> Option<String> {
    valid_prefix(path).map(|prefix| prefix[3..5].to_string())
}

/// Remove a valid prefix from the path.
///
/// The remainder is trimmed and put behind a single leading slash, so
/// `/xx-yy/foo/` becomes `/foo`, `/xx-yy//foo` becomes `/foo` and `/xx-yy`
/// becomes `/`. The result never starts with `//` or `/\`, which clients
/// would read as another host. A path without a valid prefix is returned
/// untouched, not normalized.
pub fn remove_valid_prefix(path: &str) -> String {
    if !has_valid_prefix(path) {
        return path.to_string();
    }
    let rest = path
        .trim_matches('/')
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    format!(
        "/{}",
        rest.trim_start_matches(&['/', '\\'][..]).trim_end_matches('/')
    )
}

/// Decode `%XX` escapes and `+` the way form-encoded URLs do.
///
/// Malformed escapes are kept literally. Bytes that do not form valid UTF-8
/// after decoding are replaced, which can never produce a valid prefix.
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(high), Some(low)) => {
                        decoded.push(high << 4 | low);
                        i += 3;
                    }
                    _ => {
                        decoded.push(b'%');
                        i += 1;
                    }
                }
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
