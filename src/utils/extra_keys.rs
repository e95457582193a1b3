//! Reporting of API fields the typed models do not know about.
//!
//! The vendor adds fields to its responses without notice. Unknown keys are
//! logged at DEBUG so they stay out of normal output; set
//! `MYSKODA_SHOW_EXTRA_KEYS=1` (or `logging.show_extra_keys`) to see them at
//! INFO. Credentials are masked and long payloads truncated before logging.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const SHOW_EXTRA_KEYS_ENV: &str = "MYSKODA_SHOW_EXTRA_KEYS";

const MAX_LOGGED_LEN: usize = 300;
const MASK: &str = "***";

const CREDENTIAL_KEYS: &[&str] = &[
    "password",
    "token",
    "access_token",
    "accesstoken",
    "refresh_token",
    "refreshtoken",
    "id_token",
    "idtoken",
    "secret",
    "client_secret",
    "code",
    "authorization",
    "currentspin",
    "spin",
];

fn is_credential_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    CREDENTIAL_KEYS.contains(&lowered.as_str())
}

pub fn show_extra_keys_from_env() -> bool {
    matches!(
        std::env::var(SHOW_EXTRA_KEYS_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("True")
    )
}

/// Returns a copy of `value` with every credential-like field masked, at any depth.
pub fn remove_credentials(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let masked = if is_credential_key(key) && !inner.is_null() {
                        Value::String(MASK.to_string())
                    } else {
                        remove_credentials(inner)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(remove_credentials).collect()),
        other => other.clone(),
    }
}

pub fn truncate(value: &Value, max_len: usize) -> String {
    let rendered = serde_json::to_string(value).unwrap_or_else(|_| value.to_string());
    if rendered.chars().count() > max_len {
        let mut cut: String = rendered.chars().take(max_len).collect();
        cut.push_str("...");
        cut
    } else {
        rendered
    }
}

/// Logs keys of `dictionary` that are not in `allowed_keys` and returns them.
pub fn log_extra_keys(
    location: &str,
    dictionary: &Map<String, Value>,
    allowed_keys: &[&str],
    show_info: bool,
) -> BTreeSet<String> {
    let extra: BTreeSet<String> = dictionary
        .keys()
        .filter(|key| !allowed_keys.contains(&key.as_str()))
        .cloned()
        .collect();
    if extra.is_empty() {
        return extra;
    }

    let sanitized = remove_credentials(&Value::Object(dictionary.clone()));
    let summary = truncate(&sanitized, MAX_LOGGED_LEN);
    if show_info || show_extra_keys_from_env() {
        tracing::info!(
            "Unexpected keys found in {}: {:?} Dictionary is {}",
            location,
            extra,
            summary
        );
    } else {
        tracing::debug!(
            "Unexpected keys found in {}: {:?} Dictionary is {}",
            location,
            extra,
            summary
        );
    }
    extra
}
