use super::splice::{splice_json, splice_yaml};
use super::{BuildEntry, MetadataFormat};
use crate::error::MetadataError;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub(super) const BUILDS_KEY: &str = "Builds";
pub(super) const REPO_KEY: &str = "Repo";

/// The metadata record of one app, as loaded from `metadata/<appid>.<ext>`.
///
/// Top-level fields other than `Builds` are kept as an ordered document so
/// that writing the record back touches nothing but `Repo` and `Builds`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRecord {
    pub app_id: String,
    pub metadata_path: PathBuf,
    pub format: MetadataFormat,
    pub builds: Vec<BuildEntry>,
    document: Mapping,
    source: Option<LoadedText>,
}

/// The file text a record was parsed from, with what it held at the time.
#[derive(Debug, Clone, PartialEq)]
struct LoadedText {
    text: String,
    builds: usize,
    repo: Option<String>,
}

impl ApplicationRecord {
    pub fn from_document(
        app_id: impl Into<String>,
        metadata_path: impl Into<PathBuf>,
        format: MetadataFormat,
        document: Mapping,
    ) -> Result<Self, MetadataError> {
        let metadata_path = metadata_path.into();

        let builds = match document.get(BUILDS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(value @ Value::Sequence(_)) => serde_yaml::from_value(value.clone())
                .map_err(|e| invalid_field(&metadata_path, BUILDS_KEY, e.to_string()))?,
            Some(_) => {
                return Err(invalid_field(
                    &metadata_path,
                    BUILDS_KEY,
                    "expected a list of builds".to_string(),
                ))
            }
        };

        if let Some(repo) = document.get(REPO_KEY) {
            if !repo.is_string() && !repo.is_null() {
                return Err(invalid_field(
                    &metadata_path,
                    REPO_KEY,
                    "expected a string".to_string(),
                ));
            }
        }

        Ok(Self {
            app_id: app_id.into(),
            metadata_path,
            format,
            builds,
            document,
            source: None,
        })
    }

    /// Remember the text this record was parsed from so that `render` can
    /// edit it instead of re-serializing the whole document.
    pub fn with_source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(LoadedText {
            text: text.into(),
            builds: self.builds.len(),
            repo: self.repo().map(str::to_string),
        });
        self
    }

    pub fn repo(&self) -> Option<&str> {
        self.document.get(REPO_KEY).and_then(Value::as_str)
    }

    /// Overwrite `Repo`, keeping its position when the key already exists.
    pub fn set_repo(&mut self, repo: impl Into<String>) {
        self.document
            .insert(Value::from(REPO_KEY), Value::from(repo.into()));
    }

    pub fn last_build(&self) -> Option<&BuildEntry> {
        self.builds.last()
    }

    /// The last build carrying `version_code`; later entries supersede earlier
    /// ones with the same code.
    pub fn build_by_version_code(&self, version_code: u64) -> Option<&BuildEntry> {
        self.builds.iter().rev().find(|b| b.version_code == version_code)
    }

    /// The full document with `Builds` re-rendered from `self.builds`.
    pub fn to_document(&self) -> Result<Mapping, MetadataError> {
        let mut document = self.document.clone();

        if !self.builds.is_empty() || document.contains_key(BUILDS_KEY) {
            let builds = serde_yaml::to_value(&self.builds).map_err(|e| MetadataError::Serialize {
                path: self.metadata_path.clone(),
                message: e.to_string(),
            })?;
            document.insert(Value::from(BUILDS_KEY), builds);
        }

        Ok(document)
    }

    /// Text of this record in `format`.
    ///
    /// A record loaded with `with_source` that has only gained builds or a new
    /// `Repo` keeps every other byte of its file. Anything else is rendered
    /// from `to_document`.
    pub fn render(&self, format: MetadataFormat) -> Result<String, MetadataError> {
        if let Some(text) = self.render_in_place(format)? {
            return Ok(text);
        }
        format.render(&self.metadata_path, &self.to_document()?)
    }

    fn render_in_place(&self, format: MetadataFormat) -> Result<Option<String>, MetadataError> {
        let Some(source) = &self.source else {
            return Ok(None);
        };
        if format != self.format || self.builds.len() < source.builds {
            return Ok(None);
        }

        let repo = self.repo().filter(|repo| source.repo.as_deref() != Some(*repo));
        let appended = &self.builds[source.builds..];
        let spliced = match format {
            MetadataFormat::Yaml => splice_yaml(&source.text, repo, appended),
            MetadataFormat::Json => splice_json(&source.text, repo, appended),
        }
        .map_err(|message| MetadataError::Serialize {
            path: self.metadata_path.clone(),
            message,
        })?;

        match spliced {
            Some(text) if self.describes(&text) => Ok(Some(text)),
            Some(_) => {
                debug!("{}: in-place edit diverged, re-rendering", self.app_id);
                Ok(None)
            }
            None => {
                debug!("{}: layout not editable in place, re-rendering", self.app_id);
                Ok(None)
            }
        }
    }

    /// Whether `text` parses back to exactly this record.
    fn describes(&self, text: &str) -> bool {
        let Ok(document) = self.format.parse(&self.metadata_path, text) else {
            return false;
        };
        let Ok(reparsed) = Self::from_document(
            self.app_id.clone(),
            self.metadata_path.clone(),
            self.format,
            document,
        ) else {
            return false;
        };

        let without_builds = |document: &Mapping| {
            let mut document = document.clone();
            document.remove(BUILDS_KEY);
            document
        };
        reparsed.builds == self.builds
            && without_builds(&reparsed.document) == without_builds(&self.document)
    }
}

fn invalid_field(path: &Path, field: &str, message: String) -> MetadataError {
    MetadataError::InvalidField {
        path: path.to_path_buf(),
        field: field.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"Categories:
- Internet
License: GPL-3.0-or-later
SourceCode: https://gitlab.com/example/app
RepoType: git
Repo: https://gitlab.com/example/app.git
Builds:
- versionName: 1.0.0
  versionCode: 100
  commit: v1.0.0
  subdir: app
  gradle:
  - fdroid
- versionName: 1.1.0
  versionCode: 110
  commit: v1.1.0
  subdir: app
  gradle:
  - fdroid
AutoUpdateMode: Version
CurrentVersionCode: 110
"#;

    fn record() -> ApplicationRecord {
        let path = PathBuf::from("metadata/org.example.app.yml");
        let doc = MetadataFormat::Yaml.parse(&path, RECORD).unwrap();
        ApplicationRecord::from_document("org.example.app", path, MetadataFormat::Yaml, doc)
            .unwrap()
    }

    #[test]
    fn test_loads_builds_in_order() {
        let app = record();
        let codes: Vec<u64> = app.builds.iter().map(|b| b.version_code).collect();

        assert_eq!(codes, vec![100, 110]);
        assert_eq!(app.last_build().unwrap().version_name, "1.1.0");
        assert_eq!(app.repo(), Some("https://gitlab.com/example/app.git"));
    }

    #[test]
    fn test_unchanged_record_renders_identically() {
        let app = record();
        let doc = app.to_document().unwrap();

        let rendered = MetadataFormat::Yaml
            .render(&app.metadata_path, &doc)
            .unwrap();
        assert_eq!(rendered, RECORD);
    }

    #[test]
    fn test_set_repo_keeps_key_position() {
        let mut app = record();
        app.set_repo("file:///builds/example");

        let doc = app.to_document().unwrap();
        let keys: Vec<&str> = doc.keys().filter_map(Value::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "Categories",
                "License",
                "SourceCode",
                "RepoType",
                "Repo",
                "Builds",
                "AutoUpdateMode",
                "CurrentVersionCode"
            ]
        );
        assert_eq!(app.repo(), Some("file:///builds/example"));
    }

    #[test]
    fn test_build_by_version_code() {
        let app = record();
        assert_eq!(
            app.build_by_version_code(100).unwrap().commit.as_deref(),
            Some("v1.0.0")
        );
        assert!(app.build_by_version_code(999).is_none());
    }

    #[test]
    fn test_build_by_version_code_prefers_latest_entry() {
        let path = PathBuf::from("metadata/org.example.rebuilt.yml");
        let doc = MetadataFormat::Yaml
            .parse(
                &path,
                "Builds:\n- versionName: '5'\n  versionCode: 5\n  commit: first\n- versionName: '5'\n  versionCode: 5\n  commit: second\n",
            )
            .unwrap();
        let app = ApplicationRecord::from_document("org.example.rebuilt", path, MetadataFormat::Yaml, doc)
            .unwrap();

        assert_eq!(
            app.build_by_version_code(5).unwrap().commit.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_record_without_builds() {
        let path = PathBuf::from("metadata/org.example.empty.yml");
        let doc = MetadataFormat::Yaml
            .parse(&path, "License: MIT\n")
            .unwrap();
        let app = ApplicationRecord::from_document("org.example.empty", path, MetadataFormat::Yaml, doc)
            .unwrap();

        assert!(app.builds.is_empty());
        assert!(app.last_build().is_none());
        assert!(!app.to_document().unwrap().contains_key("Builds"));
    }

    #[test]
    fn test_builds_must_be_a_list() {
        let path = PathBuf::from("metadata/org.example.bad.yml");
        let doc = MetadataFormat::Yaml
            .parse(&path, "Builds: nope\n")
            .unwrap();
        let err = ApplicationRecord::from_document("org.example.bad", path, MetadataFormat::Yaml, doc)
            .unwrap_err();

        assert!(matches!(err, MetadataError::InvalidField { ref field, .. } if field == "Builds"));
    }
}
