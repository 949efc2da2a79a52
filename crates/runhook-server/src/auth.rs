//! Shared-token guard for the config and webhook routes.
//!
//! The guard holds an HMAC tag keyed by the expected token; a request passes
//! when the tag recomputed under the presented token verifies.

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ring::hmac;
use runhook_core::{Result, RunhookError};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;
use crate::api::ApiError;

const TAG_INPUT: &[u8] = b"runhook access token";

/// Checks a presented token against the configured one.
#[derive(Debug, Clone)]
pub struct TokenGuard {
    header: String,
    expected: Option<hmac::Tag>,
}

impl TokenGuard {
    /// `token` of `None` (or empty) rejects every request.
    pub fn new(header: &str, token: Option<&str>) -> Self {
        let expected = token.filter(|t| !t.is_empty()).map(|t| {
            let key = hmac::Key::new(hmac::HMAC_SHA256, t.as_bytes());
            hmac::sign(&key, TAG_INPUT)
        });
        Self {
            header: header.to_ascii_lowercase(),
            expected,
        }
    }

    /// Name of the header the token is read from.
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn check(&self, provided: Option<&str>) -> Result<()> {
        let expected = self
            .expected
            .as_ref()
            .ok_or_else(|| RunhookError::Auth("no access token configured".into()))?;
        let provided = provided
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RunhookError::Auth("missing access token".into()))?;

        let key = hmac::Key::new(hmac::HMAC_SHA256, provided.as_bytes());
        hmac::verify(&key, TAG_INPUT, expected.as_ref())
            .map_err(|_| RunhookError::Auth("invalid access token".into()))
    }

    /// Token from `headers`, if present and valid UTF-8.
    pub fn extract<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    }
}

/// Middleware that short-circuits with 401 unless the request carries the
/// configured token. The wrapped handler never runs on rejection.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match state.guard.check(state.guard.extract(&headers)) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            state.metrics.inc_auth_rejections();
            warn!(path = %request.uri().path(), error = %e, "unauthorized request");
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_token_passes() {
        let guard = TokenGuard::new("X-Access-Token", Some("s3cret"));
        assert!(guard.check(Some("s3cret")).is_ok());
        assert_eq!(guard.header(), "x-access-token");
    }

    #[test]
    fn test_wrong_or_missing_token_fails() {
        let guard = TokenGuard::new("x-access-token", Some("s3cret"));
        assert!(guard.check(Some("s3cret ")).is_err());
        assert!(guard.check(Some("S3CRET")).is_err());
        assert!(guard.check(Some("")).is_err());
        assert!(guard.check(None).is_err());
    }

    #[test]
    fn test_unconfigured_guard_rejects_everything() {
        let guard = TokenGuard::new("x-access-token", None);
        assert!(guard.check(Some("anything")).is_err());
        let guard = TokenGuard::new("x-access-token", Some(""));
        assert!(guard.check(Some("")).is_err());
    }

    #[test]
    fn test_extract_reads_configured_header() {
        let guard = TokenGuard::new("x-runhook-key", Some("k"));
        let mut headers = HeaderMap::new();
        headers.insert("x-runhook-key", " k ".parse().unwrap());
        assert_eq!(guard.extract(&headers), Some("k"));
        assert!(guard.check(guard.extract(&headers)).is_ok());
    }
}
