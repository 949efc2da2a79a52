//! # runhook-config
//!
//! Settings for the runhook service itself. Reads from `runhook.toml` and
//! environment variables. The environment overrides plain settings; secrets
//! (access token, webhook secret, GitHub token) come from the environment
//! only when the file leaves them unset or empty.
//!
//! These are distinct from the configuration document the service edits on
//! behalf of the web form; that lives in `runhook-store`.

pub mod loader;
pub mod schema;

pub use loader::SettingsLoader;
pub use schema::{ConfigWarning, Settings, WarningSeverity};
