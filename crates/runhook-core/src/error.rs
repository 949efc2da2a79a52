use thiserror::Error;

/// Unified error type for the runhook workspace.
#[derive(Error, Debug)]
pub enum RunhookError {
    // ── Config document errors ─────────────────────────────────
    #[error("failed to read config {path}: {reason}")]
    ConfigRead { path: String, reason: String },

    #[error("failed to write config {path}: {reason}")]
    ConfigWrite { path: String, reason: String },

    // ── Auth errors ────────────────────────────────────────────
    #[error("unauthorized: {0}")]
    Auth(String),

    // ── Webhook / sync errors ──────────────────────────────────
    #[error("webhook error: {0}")]
    Webhook(String),

    #[error("sync failed: {0}")]
    Sync(String),

    // ── Service settings errors ────────────────────────────────
    #[error("settings error: {0}")]
    Settings(String),

    #[error("settings validation failed: {field}: {reason}")]
    SettingsValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RunhookError {
    /// Shorthand for a [`RunhookError::ConfigRead`] tied to a file path.
    pub fn config_read(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::ConfigRead {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`RunhookError::ConfigWrite`] tied to a file path.
    pub fn config_write(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::ConfigWrite {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunhookError>;
