//! Recording [`RepoSync`] for deterministic tests.
//!
//! Never touches the filesystem; counts how often it was asked to sync.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::repo::{RepoSync, SyncReport};
use runhook_core::{Result, RunhookError};

/// A fake sync that records invocations.
///
/// # Example
/// ```
/// use runhook_sync::MockSync;
/// let sync = MockSync::new();
/// let probe = sync.clone();
/// assert_eq!(probe.calls(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockSync {
    calls: Arc<AtomicUsize>,
    /// If set, every sync fails with this message.
    error: Option<String>,
}

impl MockSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose syncs always fail.
    pub fn failing(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }

    /// Number of times `sync` has been called, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoSync for MockSync {
    fn name(&self) -> &str {
        "mock"
    }

    async fn sync(&self) -> Result<SyncReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.error {
            Some(ref msg) => Err(RunhookError::Sync(msg.clone())),
            None => Ok(SyncReport {
                output: "Already up to date.".into(),
            }),
        }
    }
}
