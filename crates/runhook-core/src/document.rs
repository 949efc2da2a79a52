//! The configuration document managed by the service, and the partial update
//! the web form posts against it.
//!
//! Only a handful of keys are understood. Everything else found in the file,
//! at the top level or inside a known section, rides along in the `extra`
//! maps so a save never drops keys someone added by hand.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Keys the update logic does not know about, preserved verbatim.
pub type Passthrough = BTreeMap<String, serde_yaml::Value>;

/// Root document, mapped to `config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(deserialize_with = "null_as_default")]
    pub project: ProjectSection,
    #[serde(deserialize_with = "null_as_default")]
    pub github: GithubSection,
    #[serde(deserialize_with = "null_as_default")]
    pub service: ServiceSection,
    #[serde(flatten)]
    pub extra: Passthrough,
}

// ── Sections ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Cloud project identifier.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub name: Option<String>,
    /// Deployment region, e.g. "us-central1".
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub region: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    /// Clone URL of the repository the notebook is read from.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub source_repo_url: Option<String>,
    /// `owner/name` of the repository results are pushed to.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub target_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub notebook_path: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "string_field")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A bare `project:` line in YAML is null; treat it as an empty section.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Recognized fields must be YAML strings; unquoted `2024` or `true` is rejected.
fn string_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, Unexpected};
    use serde_yaml::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Bool(b)) => Err(D::Error::invalid_type(Unexpected::Bool(b), &"a string")),
        Some(Value::Number(n)) => Err(D::Error::invalid_type(
            Unexpected::Other(&format!("number {n}")),
            &"a string",
        )),
        Some(Value::Sequence(_)) => Err(D::Error::invalid_type(Unexpected::Seq, &"a string")),
        Some(Value::Mapping(_)) => Err(D::Error::invalid_type(Unexpected::Map, &"a string")),
        Some(Value::Tagged(_)) => Err(D::Error::invalid_type(
            Unexpected::Other("tagged value"),
            &"a string",
        )),
    }
}

impl Document {
    /// Apply every field present in `update`, creating sections as needed.
    /// Absent fields and unknown keys are left exactly as they were.
    pub fn merge(&mut self, update: &ConfigUpdate) {
        if let Some(ref v) = update.project_id {
            self.project.id = Some(v.clone());
        }
        if let Some(ref v) = update.project_name {
            self.project.name = Some(v.clone());
        }
        if let Some(ref v) = update.region {
            self.project.region = Some(v.clone());
        }
        if let Some(ref v) = update.source_repo {
            self.github.source_repo_url = Some(v.clone());
        }
        if let Some(ref v) = update.target_repo {
            self.github.target_repo = Some(v.clone());
        }
        if let Some(ref v) = update.notebook_path {
            self.github.notebook_path = Some(v.clone());
        }
        if let Some(ref v) = update.service_name {
            self.service.name = Some(v.clone());
        }
    }

    /// Consuming variant of [`Document::merge`].
    pub fn merged(mut self, update: &ConfigUpdate) -> Self {
        self.merge(update);
        self
    }
}

// ── Partial update ─────────────────────────────────────────────

/// Body of `POST /save-config`. Each field is optional; only the ones present
/// in the request touch the document. A JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_repo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl ConfigUpdate {
    /// Document paths (`section.key`) this update will write.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        [
            (self.project_id.is_some(), "project.id"),
            (self.project_name.is_some(), "project.name"),
            (self.region.is_some(), "project.region"),
            (self.source_repo.is_some(), "github.source_repo_url"),
            (self.target_repo.is_some(), "github.target_repo"),
            (self.notebook_path.is_some(), "github.notebook_path"),
            (self.service_name.is_some(), "service.name"),
        ]
        .into_iter()
        .filter_map(|(present, path)| present.then_some(path))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_only_touches_present_fields() {
        let mut doc = Document::default();
        doc.github.target_repo = Some("acme/results".into());

        doc.merge(&ConfigUpdate {
            project_id: Some("abc123".into()),
            ..Default::default()
        });

        assert_eq!(doc.project.id.as_deref(), Some("abc123"));
        assert!(doc.project.name.is_none());
        assert_eq!(doc.github.target_repo.as_deref(), Some("acme/results"));
    }

    #[test]
    fn test_touched_fields_order() {
        let update = ConfigUpdate {
            service_name: Some("svc".into()),
            region: Some("europe-west1".into()),
            ..Default::default()
        };
        assert_eq!(update.touched_fields(), vec!["project.region", "service.name"]);
        assert!(ConfigUpdate::default().touched_fields().is_empty());
    }

    #[test]
    fn test_null_section_reads_as_empty() {
        let doc: Document = serde_yaml::from_str("project:\ngithub:\n  target_repo: a/b\n").unwrap();
        assert_eq!(doc.project, ProjectSection::default());
        assert_eq!(doc.github.target_repo.as_deref(), Some("a/b"));
    }

    #[test]
    fn test_non_string_recognized_field_is_rejected() {
        let err = serde_yaml::from_str::<Document>("service:\n  name: 2024\n").unwrap_err();
        assert!(err.to_string().contains("expected a string"), "{err}");
        assert!(serde_yaml::from_str::<Document>("project:\n  id: true\n").is_err());
        assert!(serde_yaml::from_str::<Document>("github:\n  target_repo: [a, b]\n").is_err());

        let doc: Document =
            serde_yaml::from_str("service:\n  name: '2024'\n  replicas: 3\nproject:\n  id: ~\n").unwrap();
        assert_eq!(doc.service.name.as_deref(), Some("2024"));
        assert!(doc.project.id.is_none());
        assert_eq!(doc.service.extra.get("replicas").and_then(|v| v.as_u64()), Some(3));
    }
}
