//! # runhook-sync
//!
//! Everything behind `POST /webhook` that is not HTTP:
//!
//! - [`RepoSync`]: the narrow interface for "bring the working copy up to date",
//!   with [`GitPull`] as the real implementation and [`MockSync`] for tests
//! - [`PushEvent`]: the slice of a GitHub push payload the trigger cares about
//! - [`signature`]: `X-Hub-Signature-256` verification

pub mod event;
pub mod mock;
pub mod repo;
pub mod signature;

pub use event::PushEvent;
pub use mock::MockSync;
pub use repo::{GitPull, RepoSync, SyncReport};
