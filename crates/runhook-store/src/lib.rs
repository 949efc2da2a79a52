//! # runhook-store
//!
//! File-backed store for the configuration [`Document`]. There is no cache:
//! every [`DocumentStore::load`] goes to disk, so a save is visible to the
//! very next read. Saves replace the whole file through a temp file and a
//! rename, so readers never observe a half-written document.

use parking_lot::Mutex;
use runhook_core::{ConfigUpdate, Document, Result, RunhookError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to the YAML document on disk.
///
/// Read-modify-write cycles through one handle are serialized; writers that
/// bypass the handle (another process, a second handle, a hand edit) are
/// last-write-wins.
pub struct DocumentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the backing file.
    ///
    /// Missing sections come back empty; a missing or unparsable file is a
    /// [`RunhookError::ConfigRead`], as is a recognized field that is not a
    /// string. An empty or null file is an empty document.
    pub fn load(&self) -> Result<Document> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| RunhookError::config_read(self.path.display(), e))?;

        if raw.trim().is_empty() {
            return Ok(Document::default());
        }

        // A bare `~` or `null` document is as empty as a blank file.
        serde_yaml::from_str::<Option<Document>>(&raw)
            .map(Option::unwrap_or_default)
            .map_err(|e| RunhookError::config_read(self.path.display(), e))
    }

    /// Overwrite the backing file with `doc`.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.write(doc)
    }

    /// Load, apply `update`, save, and return what was written.
    pub fn update(&self, update: &ConfigUpdate) -> Result<Document> {
        let _guard = self.write_lock.lock();
        let doc = self.load()?.merged(update);
        self.write(&doc)?;
        info!(path = %self.path.display(), fields = ?update.touched_fields(), "configuration updated");
        Ok(doc)
    }

    /// Write an empty document if the backing file does not exist yet.
    /// Returns `true` when a file was created.
    pub fn init(&self) -> Result<bool> {
        let _guard = self.write_lock.lock();
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.parent_dir() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RunhookError::config_write(self.path.display(), e))?;
        }
        self.write(&Document::default())?;
        info!(path = %self.path.display(), "created empty configuration document");
        Ok(true)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Temp file in the target directory, then rename over the target.
    /// Caller holds `write_lock`.
    fn write(&self, doc: &Document) -> Result<()> {
        let yaml = serde_yaml::to_string(doc)
            .map_err(|e| RunhookError::config_write(self.path.display(), e))?;

        let dir = self.parent_dir().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| RunhookError::config_write(self.path.display(), e))?;
        if let Ok(meta) = std::fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| RunhookError::config_write(self.path.display(), e))?;
        }
        tmp.write_all(yaml.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| RunhookError::config_write(self.path.display(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| RunhookError::config_write(self.path.display(), e.error))?;

        debug!(path = %self.path.display(), bytes = yaml.len(), "configuration written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("config.yaml"));
        match store.load() {
            Err(RunhookError::ConfigRead { path, .. }) => assert!(path.ends_with("config.yaml")),
            other => panic!("expected ConfigRead, got {other:?}"),
        }
    }

    #[test]
    fn test_load_empty_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "\n  \n").unwrap();
        let store = DocumentStore::new(&path);
        assert_eq!(store.load().unwrap(), Document::default());
    }

    #[test]
    fn test_save_to_missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("nope").join("config.yaml"));
        let err = store.save(&Document::default()).unwrap_err();
        assert!(matches!(err, RunhookError::ConfigWrite { .. }));
    }

    #[test]
    fn test_init_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("nested").join("config.yaml"));
        assert!(store.init().unwrap());
        assert!(!store.init().unwrap());
        assert_eq!(store.load().unwrap(), Document::default());
    }
}
