//! # Format Recognizers
//!
//! Best-effort checks for named `format` values. Only strings are
//! checked; other kinds pass. Unknown format names are not an error:
//! [`check`] returns `None` and the keyword stays an annotation.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate};
use jsv_core::JsonPointer;
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::options::DEFAULT_BASE_URI;

/// Format names with a recognizer.
pub const KNOWN_FORMATS: &[&str] = &[
    "date-time",
    "date",
    "time",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "uri",
    "uri-reference",
    "json-pointer",
    "regex",
];

/// Check `instance` against the named format.
///
/// Returns `None` for an unrecognized format name, `Some(true)` for
/// non-string instances and conforming strings.
pub fn check(format: &str, instance: &Value) -> Option<bool> {
    let recognizer: fn(&str) -> bool = match format {
        "date-time" => is_date_time,
        "date" => is_date,
        "time" => is_time,
        "email" => is_email,
        "hostname" => is_hostname,
        "ipv4" => |s: &str| s.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => |s: &str| s.parse::<Ipv6Addr>().is_ok(),
        "uri" => |s: &str| Url::parse(s).is_ok(),
        "uri-reference" => is_uri_reference,
        "json-pointer" => |s: &str| JsonPointer::parse(s).is_ok(),
        "regex" => |s: &str| Regex::new(s).is_ok(),
        _ => return None,
    };
    Some(match instance {
        Value::String(s) => recognizer(s),
        _ => true,
    })
}

/// RFC 3339 `date-time`, e.g. `2018-11-13T20:20:39+00:00`.
fn is_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

/// RFC 3339 `full-date`, e.g. `2018-11-13`.
fn is_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `full-time`, e.g. `20:20:39Z` or `20:20:39.5+01:00`.
fn is_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{s}")).is_ok()
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.contains(char::is_whitespace) {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => {
            literal.parse::<Ipv4Addr>().is_ok()
                || literal
                    .strip_prefix("IPv6:")
                    .is_some_and(|v6| v6.parse::<Ipv6Addr>().is_ok())
        }
        None => is_hostname(domain),
    }
}

/// RFC 1123 host name: dot-separated labels of 1-63 letters, digits and
/// hyphens, not starting or ending with a hyphen, 253 characters at most.
fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }
    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn is_uri_reference(s: &str) -> bool {
    if s.contains(char::is_whitespace) {
        return false;
    }
    Url::parse(DEFAULT_BASE_URI)
        .and_then(|base| base.join(s))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(format: &str, s: &str) -> bool {
        check(format, &json!(s)).unwrap()
    }

    #[test]
    fn test_unknown_format_not_recognized() {
        assert_eq!(check("credit-card", &json!("4111")), None);
    }

    #[test]
    fn test_non_strings_pass() {
        assert_eq!(check("email", &json!(42)), Some(true));
        assert_eq!(check("ipv4", &json!(null)), Some(true));
    }

    #[test]
    fn test_date_time() {
        assert!(ok("date-time", "2018-11-13T20:20:39+00:00"));
        assert!(ok("date-time", "2018-11-13T20:20:39.123Z"));
        assert!(!ok("date-time", "2018-11-13 20:20:39"));
        assert!(!ok("date-time", "2018-02-30T00:00:00Z"));
        assert!(ok("date", "2018-11-13"));
        assert!(!ok("date", "2018-11-13T00:00:00Z"));
        assert!(ok("time", "20:20:39Z"));
        assert!(!ok("time", "25:00:00Z"));
    }

    #[test]
    fn test_email() {
        assert!(ok("email", "joe.bloggs@example.com"));
        assert!(ok("email", "postmaster@[192.168.0.1]"));
        assert!(!ok("email", "joe.bloggs"));
        assert!(!ok("email", "@example.com"));
        assert!(!ok("email", "joe..bloggs@example.com"));
        assert!(!ok("email", "joe@-example.com"));
    }

    #[test]
    fn test_hostname() {
        assert!(ok("hostname", "www.example.com"));
        assert!(ok("hostname", "localhost"));
        assert!(!ok("hostname", "-bad.example"));
        assert!(!ok("hostname", "under_score.example"));
        assert!(!ok("hostname", &"a".repeat(64)));
    }

    #[test]
    fn test_ip_addresses() {
        assert!(ok("ipv4", "192.168.0.1"));
        assert!(!ok("ipv4", "256.1.1.1"));
        assert!(!ok("ipv4", "::1"));
        assert!(ok("ipv6", "::1"));
        assert!(ok("ipv6", "2001:db8::8a2e:370:7334"));
        assert!(!ok("ipv6", "12345::"));
    }

    #[test]
    fn test_uris_and_pointers() {
        assert!(ok("uri", "https://json-schema.org/understanding-json-schema/"));
        assert!(!ok("uri", "understanding-json-schema"));
        assert!(ok("uri-reference", "../reference/ref.json#/definitions/a"));
        assert!(!ok("uri-reference", "has space"));
        assert!(ok("json-pointer", "/definitions/a~1b"));
        assert!(!ok("json-pointer", "definitions"));
        assert!(ok("regex", "^[a-z]+$"));
        assert!(!ok("regex", "("));
    }
}
