use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

static SENSITIVE_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["password", "secret", "token", "passcode", "id_token", "authorization"]
        .into_iter()
        .collect()
});

static SENSITIVE_HEADER_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "authorization",
        "proxy-authorization",
        "x-auth-token",
        "x-subject-token",
        "x-service-token",
    ]
    .into_iter()
    .collect()
});

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            // fernet tokens
            Regex::new(r"\bgAAAAA[A-Za-z0-9_-]{20,}={0,2}").expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~-]{10,})\b").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r#"\b(password|secret|token)\b\s*([:=])\s*([^\s"'`&]+)"#)
                .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = normalize_key(key);
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(normalized.as_str())
        || normalized.contains("secret")
        || normalized.ends_with("password")
}

pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADER_KEYS.contains(normalize_key(name).as_str())
}

pub fn redact_text(value: &str) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    out
}

/// Header map rendered for logs, sorted by name, auth headers masked.
pub fn redact_headers(headers: &HashMap<String, String>) -> Value {
    let sorted: BTreeMap<&String, &String> = headers.iter().collect();
    let mut out = serde_json::Map::new();
    for (key, value) in sorted {
        let rendered = if is_sensitive_header(key) {
            DEFAULT_REDACTION.to_string()
        } else {
            redact_text(value)
        };
        out.insert(key.clone(), Value::String(rendered));
    }
    Value::Object(out)
}

pub fn redact_object(value: &Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
        Value::String(text) => Value::String(redact_text(text)),
        Value::Array(items) => Value::Array(items.iter().map(redact_object).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) && !entry.is_object() {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                    continue;
                }
                out.insert(key.clone(), redact_object(entry));
            }
            Value::Object(out)
        }
    }
}
