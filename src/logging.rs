//! Request and response logging with header redaction.
//!
//! Method and URL log at info, headers at debug, bodies at trace. Bodies are
//! truncated to [`get_max_body_len`] characters.

use crate::constants;
use crate::invocation::{RequestData, ResponseData};
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

const REDACTED: &str = "[REDACTED]";
const DEFAULT_MAX_BODY_LEN: usize = 1000;

/// Checks if a header name should be redacted
#[must_use]
pub fn should_redact_header(header_name: &str) -> bool {
    let lower = header_name.to_lowercase();
    matches!(
        lower.as_str(),
        "authorization"
            | "cookie"
            | "set-cookie"
            | "x-api-key"
            | "x-access-token"
            | "x-auth-token"
            | "api-key"
            | "api_key"
            | "token"
            | "secret"
            | "password"
    )
}

fn log_headers(label: &str, headers: &BTreeMap<String, String>) {
    if headers.is_empty() {
        return;
    }
    debug!(target: "relay::transport", "{label} headers:");
    for (name, value) in headers {
        let display_value = if should_redact_header(name) && !value.is_empty() {
            REDACTED
        } else {
            value.as_str()
        };
        debug!(target: "relay::transport", "  {name}: {display_value}");
    }
}

fn log_body(label: &str, body: Option<&serde_json::Value>, max_body_len: usize) {
    let Some(body) = body else {
        return;
    };
    let text = body.to_string();
    match text.char_indices().nth(max_body_len) {
        Some((cut, _)) => trace!(
            target: "relay::transport",
            "{label} body: {} (truncated at {max_body_len} chars)",
            &text[..cut]
        ),
        None => trace!(target: "relay::transport", "{label} body: {text}"),
    }
}

pub fn log_request(request: &RequestData, max_body_len: usize) {
    info!(target: "relay::transport", "→ {} {}", request.method.to_uppercase(), request.url);
    log_headers("Request", &request.headers);
    log_body("Request", request.body.as_ref(), max_body_len);
}

pub fn log_response(response: &ResponseData, max_body_len: usize) {
    info!(target: "relay::transport", "← {}", response.status);
    log_headers("Response", &response.headers);
    log_body("Response", response.body.as_ref(), max_body_len);
}

/// Gets the maximum logged body length from `RELAY_LOG_MAX_BODY`.
#[must_use]
pub fn get_max_body_len() -> usize {
    std::env::var(constants::ENV_RELAY_LOG_MAX_BODY)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_BODY_LEN)
}
