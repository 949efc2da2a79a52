#[cfg(test)]
mod tests {
    use runhook_core::{ConfigUpdate, Document, RunhookError};
    use runhook_store::DocumentStore;
    use std::sync::Arc;

    fn store_with(contents: &str) -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        (dir, DocumentStore::new(path))
    }

    const SAMPLE: &str = r#"
project:
  id: demo-project
  name: Demo
  region: us-central1
github:
  source_repo_url: https://github.com/acme/notebooks.git
  target_repo: acme/results
  notebook_path: run.ipynb
  default_branch: main
service:
  name: runner
labels:
  team: data
"#;

    // ── Load / save ────────────────────────────────────────────

    #[test]
    fn test_load_full_document() {
        let (_dir, store) = store_with(SAMPLE);
        let doc = store.load().unwrap();
        assert_eq!(doc.project.region.as_deref(), Some("us-central1"));
        assert_eq!(doc.github.notebook_path.as_deref(), Some("run.ipynb"));
        assert_eq!(doc.service.name.as_deref(), Some("runner"));
        assert!(doc.github.extra.contains_key("default_branch"));
        assert!(doc.extra.contains_key("labels"));
    }

    #[test]
    fn test_partial_content_defaults_sections() {
        let (_dir, store) = store_with("service:\n  name: runner\n");
        let doc = store.load().unwrap();
        assert_eq!(doc.service.name.as_deref(), Some("runner"));
        assert!(doc.project.id.is_none());
        assert!(doc.github.target_repo.is_none());
    }

    #[test]
    fn test_malformed_yaml_is_read_error() {
        let (_dir, store) = store_with("project: [unterminated\n");
        assert!(matches!(store.load(), Err(RunhookError::ConfigRead { .. })));
    }

    #[test]
    fn test_non_mapping_document_is_read_error() {
        let (_dir, store) = store_with("- just\n- a list\n");
        assert!(matches!(store.load(), Err(RunhookError::ConfigRead { .. })));
    }

    #[test]
    fn test_null_document_is_empty() {
        for contents in ["~\n", "null\n", "---\n~\n"] {
            let (_dir, store) = store_with(contents);
            assert_eq!(store.load().unwrap(), Document::default(), "{contents:?}");
        }
    }

    #[test]
    fn test_non_string_recognized_field_is_read_error() {
        let (_dir, store) = store_with("service:\n  name: 2024\n");
        match store.load() {
            Err(RunhookError::ConfigRead { reason, .. }) => assert!(reason.contains("expected a string")),
            other => panic!("expected ConfigRead, got {other:?}"),
        }

        let (_dir, store) = store_with("service:\n  name: \"2024\"\n");
        assert_eq!(store.load().unwrap().service.name.as_deref(), Some("2024"));
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let (_dir, store) = store_with(SAMPLE);
        let doc = store.load().unwrap();
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);

        let mut changed = doc.clone();
        changed.project.name = Some("Renamed".into());
        store.save(&changed).unwrap();
        assert_eq!(store.load().unwrap(), changed);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let (dir, store) = store_with(SAMPLE);
        store.save(&Document::default()).unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store_with(SAMPLE);
        std::fs::set_permissions(store.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&Document::default()).unwrap();
        let update = ConfigUpdate {
            region: Some("europe-west1".into()),
            ..Default::default()
        };
        store.update(&update).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    // ── Update ─────────────────────────────────────────────────

    #[test]
    fn test_update_into_missing_section() {
        let (_dir, store) = store_with("service:\n  name: runner\n");
        let update = ConfigUpdate {
            project_id: Some("abc123".into()),
            ..Default::default()
        };
        store.update(&update).unwrap();

        let doc = store.load().unwrap();
        assert_eq!(doc.project.id.as_deref(), Some("abc123"));
        assert!(doc.project.name.is_none());
        assert_eq!(doc.service.name.as_deref(), Some("runner"));
        assert_eq!(doc.github, runhook_core::GithubSection::default());
    }

    #[test]
    fn test_update_reflects_fields_and_keeps_the_rest() {
        let (_dir, store) = store_with(SAMPLE);
        let before = store.load().unwrap();
        let update = ConfigUpdate {
            region: Some("europe-west4".into()),
            target_repo: Some("acme/archive".into()),
            ..Default::default()
        };
        let saved = store.update(&update).unwrap();
        let after = store.load().unwrap();
        assert_eq!(saved, after);

        assert_eq!(after.project.region.as_deref(), Some("europe-west4"));
        assert_eq!(after.github.target_repo.as_deref(), Some("acme/archive"));
        assert_eq!(after.project.id, before.project.id);
        assert_eq!(after.project.name, before.project.name);
        assert_eq!(after.github.source_repo_url, before.github.source_repo_url);
        assert_eq!(after.github.extra, before.github.extra);
        assert_eq!(after.service, before.service);
        assert_eq!(after.extra, before.extra);
    }

    #[test]
    fn test_repeated_identical_update_is_idempotent() {
        let (_dir, store) = store_with(SAMPLE);
        let update = ConfigUpdate {
            service_name: Some("runner-v2".into()),
            ..Default::default()
        };
        let first = store.update(&update).unwrap();
        let second = store.update(&update).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_on_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("config.yaml"));
        let result = store.update(&ConfigUpdate::default());
        assert!(matches!(result, Err(RunhookError::ConfigRead { .. })));
        assert!(!store.path().exists());
    }

    // ── Concurrency ────────────────────────────────────────────

    #[test]
    fn test_independent_handles_are_last_write_wins() {
        let (dir, first) = store_with("{}\n");
        let second = DocumentStore::new(dir.path().join("config.yaml"));

        // Both writers read before either writes.
        let a = first.load().unwrap().merged(&ConfigUpdate {
            project_id: Some("from-a".into()),
            ..Default::default()
        });
        let b = second.load().unwrap().merged(&ConfigUpdate {
            service_name: Some("from-b".into()),
            ..Default::default()
        });
        first.save(&a).unwrap();
        second.save(&b).unwrap();

        let doc = first.load().unwrap();
        assert_eq!(doc.service.name.as_deref(), Some("from-b"));
        assert!(doc.project.id.is_none(), "first writer's field is lost");
    }

    #[test]
    fn test_updates_through_one_handle_are_serialized() {
        let (_dir, store) = store_with("{}\n");
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let update = match i % 2 {
                        0 => ConfigUpdate {
                            project_id: Some(format!("p{i}")),
                            ..Default::default()
                        },
                        _ => ConfigUpdate {
                            notebook_path: Some(format!("nb{i}.ipynb")),
                            ..Default::default()
                        },
                    };
                    store.update(&update).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let doc = store.load().unwrap();
        assert!(doc.project.id.is_some());
        assert!(doc.github.notebook_path.is_some());
    }
}
