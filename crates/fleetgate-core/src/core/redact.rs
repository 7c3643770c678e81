// crates/fleetgate-core/src/core/redact.rs
// ============================================================================
// Module: Fleetgate Redaction
// Description: Structure-preserving scrubbing of secret-bearing values.
// Purpose: Keep credentials out of responses and audit details.
// Dependencies: regex, serde_json
// ============================================================================

//! ## Overview
//! The redactor walks arbitrary nested JSON values and replaces anything that
//! looks secret-bearing with the literal `[REDACTED]`. Two classes of matches
//! exist: mapping values whose key names a credential, and string values that
//! embed a key or bearer token. Structure is never altered; only leaf strings
//! are replaced. Redaction runs on every outbound error message, audit
//! detail, and successful operation result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use regex::RegexBuilder;
use serde_json::Value;

// ============================================================================
// SECTION: Patterns
// ============================================================================

/// Replacement literal for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Mapping keys whose values are always redacted.
static SECRET_KEY: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(r"(token|secret|api[_-]?key|password|credential|authorization)")
});

/// Secret key material embedded in string values.
static SECRET_VALUE: LazyLock<Regex> = LazyLock::new(|| case_insensitive(r"sk_[a-z0-9]{8,}"));

/// Bearer credentials embedded in string values.
static BEARER_VALUE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(r"bearer\s+[a-z0-9._-]+"));

/// Compiles a case-insensitive pattern.
#[allow(clippy::expect_used, reason = "patterns are compile-time literals")]
fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("redaction pattern compiles")
}

// ============================================================================
// SECTION: Redaction
// ============================================================================

/// Redacts a JSON value without altering its structure.
#[must_use]
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, entry) in map {
                if SECRET_KEY.is_match(key) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), redact_value(entry));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::String(text) => Value::String(redact_message(text)),
        other => other.clone(),
    }
}

/// Redacts secret patterns inside a free-form string.
#[must_use]
pub fn redact_message(text: &str) -> String {
    let pass = SECRET_VALUE.replace_all(text, REDACTED);
    BEARER_VALUE.replace_all(pass.as_ref(), REDACTED).into_owned()
}
