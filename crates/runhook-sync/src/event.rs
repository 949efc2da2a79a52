use runhook_core::{Result, RunhookError};
use serde::Deserialize;

/// The part of a GitHub push payload that decides whether to sync.
/// All other payload fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "ref")]
    pub git_ref: String,
}

impl PushEvent {
    /// Parse a raw webhook body. Invalid JSON, a missing `ref`, or a
    /// non-string `ref` is a [`RunhookError::Webhook`].
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(RunhookError::Webhook("empty payload".into()));
        }
        serde_json::from_slice(body)
            .map_err(|e| RunhookError::Webhook(format!("invalid payload: {e}")))
    }

    /// True when the push landed on `branch` (a bare name such as `main`).
    pub fn targets_branch(&self, branch: &str) -> bool {
        self.git_ref
            .strip_prefix("refs/heads/")
            .is_some_and(|b| b == branch)
    }
}
