//! Request tracing and per-root bearer authorization.

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use syncvault_core::SecretRegistry;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and potential log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    /// The value is truncated to MAX_TRACE_ID_LEN characters and stripped of
    /// anything that is not printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract bearer token from Authorization header.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(v[7..].trim())
            } else {
                None
            }
        })
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Middleware that runs the request inside a span carrying its trace ID.
pub async fn trace_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(&req);
    let span = tracing::info_span!("request", trace_id = %trace_id);

    next.run(req).instrument(span).await
}

/// Authorize a request against the secret of the root named in its path.
///
/// Runs on the raw path components, before they are validated as key
/// segments, so a caller without the root's secret always gets 401 whatever
/// the rest of the request looks like. Unknown roots and malformed root names
/// never authorize.
pub fn require_root_access(
    registry: &SecretRegistry,
    headers: &HeaderMap,
    app_id: &str,
    root_id: &str,
) -> ApiResult<()> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(ApiError::Unauthorized(
            "missing bearer token".to_string(),
        ));
    };

    if registry.verify(app_id, root_id, token) {
        Ok(())
    } else {
        tracing::debug!(app_id, root_id, "bearer token rejected");
        Err(ApiError::Unauthorized(
            "invalid token for this root".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use syncvault_core::registry::SecretMap;

    fn registry() -> SecretRegistry {
        let mut secrets = SecretMap::new();
        secrets
            .entry("app1".to_string())
            .or_default()
            .insert("root1".to_string(), "s3cret".to_string());
        SecretRegistry::from_secrets(&secrets).unwrap()
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_scheme_case_insensitive() {
        assert_eq!(extract_bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("BEARER abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers("Basic abc")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_require_root_access() {
        let registry = registry();
        assert!(require_root_access(&registry, &headers("Bearer s3cret"), "app1", "root1").is_ok());

        for (value, app, root) in [
            ("Bearer wrong", "app1", "root1"),
            ("Bearer s3cret", "app1", "root2"),
            ("Bearer s3cret", "..", "root1"),
            ("Token s3cret", "app1", "root1"),
        ] {
            let err = require_root_access(&registry, &headers(value), app, root).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)), "{value} {app}/{root}");
        }

        let err = require_root_access(&registry, &HeaderMap::new(), "app1", "root1").unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_trace_id_sanitized() {
        let id = TraceId::from_client("abc\ndef\u{1b}[31m");
        assert_eq!(id.as_str(), "abcdef[31m");

        let long = "x".repeat(500);
        assert_eq!(TraceId::from_client(&long).as_str().len(), MAX_TRACE_ID_LEN);

        let generated = TraceId::from_client("\n\n");
        assert!(Uuid::parse_str(generated.as_str()).is_ok());
    }
}
