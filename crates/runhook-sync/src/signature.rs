//! GitHub webhook signatures.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body,
//! keyed by the hook secret, and sends it as
//! `X-Hub-Signature-256: sha256=<hex digest>`.

use ring::hmac;
use runhook_core::{Result, RunhookError};

/// Header GitHub puts the signature in.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const PREFIX: &str = "sha256=";

/// Signature header value for `body` under `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    let tag = hmac::sign(&key, body);
    format!("{PREFIX}{}", hex::encode(tag.as_ref()))
}

/// Check `header` (the full `sha256=...` value) against `body`.
/// The digest comparison is constant-time.
pub fn verify(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<()> {
    let header = header.ok_or_else(|| RunhookError::Auth("missing webhook signature".into()))?;
    let digest = header
        .trim()
        .strip_prefix(PREFIX)
        .ok_or_else(|| RunhookError::Auth("unsupported signature scheme".into()))?;
    let expected = hex::decode(digest)
        .map_err(|_| RunhookError::Auth("malformed webhook signature".into()))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hmac::verify(&key, body, &expected)
        .map_err(|_| RunhookError::Auth("webhook signature mismatch".into()))
}
