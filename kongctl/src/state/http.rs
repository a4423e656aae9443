//! HTTP logging sidecar (§4.J), generalising the teacher's
//! `debug!("GET {}", url)` call sites in `vault.rs` into a reusable layer
//! with redaction and a request-id counter.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const SENSITIVE_KEYS: &[&str] = &[
    "access_token",
    "refresh_token",
    "token",
    "password",
    "secret",
    "api_key",
    "authorization",
    "cookie",
    "set_cookie",
    "private_key",
    "client_secret",
];

const PRESERVED_KEYS: &[&str] = &["token_count", "token_type"];

const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set_cookie", "x_api_key", "proxy_authorization"];

const MAX_BODY_CHARS: usize = 4096;
const REDACTED: &str = "[REDACTED]";

/// Normalizes snake_case/camelCase/kebab-case variants of a key to the same
/// lowercase snake_case form before comparing against the sensitive set.
fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        if c == '-' {
            out.push('_');
        } else if c.is_uppercase() && i != 0 {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

fn is_sensitive_key(key: &str) -> bool {
    let norm = normalize_key(key);
    !PRESERVED_KEYS.contains(&norm.as_str()) && SENSITIVE_KEYS.iter().any(|k| *k == norm)
}

fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS.contains(&normalize_key(name).as_str())
}

/// Redacts a query string's sensitive keys in place, e.g. `token=abc` -> `token=[REDACTED]`.
pub fn sanitize_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, _v)) if is_sensitive_key(k) => format!("{}={}", k, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Redacts a single header value if its name is one of the always-redacted set.
pub fn redact_header(name: &str, value: &str) -> String {
    if is_sensitive_header(name) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// Redacts sensitive keys throughout a JSON body, recursively.
pub fn redact_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                if is_sensitive_key(k) {
                    *v = serde_json::Value::String(REDACTED.to_string());
                } else {
                    redact_json(v);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                redact_json(item);
            }
        }
        _ => {}
    }
}

/// Redacts `key=value` pairs in a form-encoded body.
pub fn redact_form(body: &str) -> String {
    body.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, _v)) if is_sensitive_key(k) => format!("{}={}", k, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Best-effort plaintext redactor for bodies that are neither JSON nor
/// form-encoded: looks for `"key": "value"` / `key: value` shaped runs.
pub fn redact_plaintext(body: &str) -> String {
    let re = regex::Regex::new(r#"(?i)("?(?:access_token|refresh_token|token|password|secret|api_key|authorization|cookie|set_cookie|private_key|client_secret)"?\s*[:=]\s*)("(?:[^"\\]|\\.)*"|[^\s,}&]+)"#).unwrap();
    re.replace_all(body, |caps: &regex::Captures| format!("{}{}", &caps[1], REDACTED)).to_string()
}

/// Truncates an already-redacted body for logging, noting the original size.
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        body.to_string()
    } else {
        let prefix: String = body.chars().take(MAX_BODY_CHARS).collect();
        format!("{}... [truncated, {} bytes total]", prefix, body.len())
    }
}

/// One outbound request's logging context: a monotonic id plus the fields
/// every record carries regardless of level.
pub struct RequestContext {
    pub request_id: u64,
    pub method: String,
    pub route: String,
    pub host: String,
}

/// Assigns monotonically increasing request ids for the HTTP logging sidecar.
#[derive(Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    pub fn new() -> Self {
        RequestCounter(AtomicU64::new(1))
    }

    pub fn next(&self, method: &str, route: &str, host: &str) -> RequestContext {
        RequestContext {
            request_id: self.0.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            route: route.to_string(),
            host: host.to_string(),
        }
    }
}

pub fn log_request(ctx: &RequestContext, headers: &BTreeMap<String, String>, body: Option<&str>) {
    debug!(
        "http_request request_id={} method={} route={} host={}",
        ctx.request_id, ctx.method, ctx.route, ctx.host
    );
    if log::log_enabled!(log::Level::Trace) {
        for (k, v) in headers {
            trace!("http_request request_id={} header {}={}", ctx.request_id, k, redact_header(k, v));
        }
        if let Some(b) = body {
            trace!("http_request request_id={} body={}", ctx.request_id, truncate_body(&redact_plaintext(b)));
        }
    }
}

pub fn log_response(ctx: &RequestContext, status_code: u16, duration: Duration, content_length: Option<u64>, body: Option<&str>) {
    debug!(
        "http_response request_id={} status_code={} duration_ms={} content_length={}",
        ctx.request_id,
        status_code,
        duration.as_millis(),
        content_length.map(|n| n.to_string()).unwrap_or_else(|| "unknown".to_string())
    );
    if log::log_enabled!(log::Level::Trace) {
        if let Some(b) = body {
            trace!("http_response request_id={} body={}", ctx.request_id, truncate_body(&redact_plaintext(b)));
        }
    }
}

pub fn log_error(ctx: &RequestContext, duration: Duration, err: &dyn std::fmt::Display) {
    debug!(
        "http_error request_id={} method={} route={} duration_ms={} error={}",
        ctx.request_id,
        ctx.method,
        ctx.route,
        duration.as_millis(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_json_case_insensitively() {
        let mut v: serde_json::Value = serde_json::json!({"Access-Token": "abc", "name": "svc1"});
        redact_json(&mut v);
        assert_eq!(v["Access-Token"], REDACTED);
        assert_eq!(v["name"], "svc1");
    }

    #[test]
    fn preserves_token_count_and_type() {
        let mut v: serde_json::Value = serde_json::json!({"token_count": 4, "token_type": "bearer", "token": "abc"});
        redact_json(&mut v);
        assert_eq!(v["token_count"], 4);
        assert_eq!(v["token_type"], "bearer");
        assert_eq!(v["token"], REDACTED);
    }

    #[test]
    fn redacts_query_params() {
        assert_eq!(sanitize_query("page=2&api_key=xyz"), "page=2&api_key=[REDACTED]");
    }

    #[test]
    fn truncates_long_bodies() {
        let body = "a".repeat(5000);
        let out = truncate_body(&body);
        assert!(out.contains("truncated"));
    }

    #[test]
    fn always_redacts_authorization_header() {
        assert_eq!(redact_header("Authorization", "Bearer xyz"), REDACTED);
        assert_eq!(redact_header("X-Request-Id", "abc"), "abc");
    }
}
