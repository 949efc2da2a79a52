//! # runhook-core
//!
//! Shared vocabulary for the runhook workspace: the configuration
//! [`Document`] edited through the web form, the [`ConfigUpdate`] payload
//! that patches it, and the unified [`RunhookError`].

pub mod document;
pub mod error;

pub use document::{ConfigUpdate, Document, GithubSection, ProjectSection, ServiceSection};
pub use error::{Result, RunhookError};
