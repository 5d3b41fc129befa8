//! One pass over the selected apps: derive, synthesize, write.

use crate::config::GenCiBuildConfig;
use crate::error::GenCiBuildError;
use crate::fs::FileSystem;
use crate::metadata::{read_metadata, write_metadata, MetadataPolicy};
use crate::resolve::resolve_apps;
use crate::synth::{append_ci_build, local_repo_uri};
use crate::version::{derive_version, VersionControl};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// What the caller asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// `APPID[:VERSIONCODE]` arguments; empty means every app.
    pub apps: Vec<String>,
    pub policy: MetadataPolicy,
}

/// Summary of one record that was rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendedBuild {
    pub app_id: String,
    pub metadata_path: PathBuf,
    pub version_name: String,
    pub version_code: u64,
    pub commit: Option<String>,
    pub repo: String,
    pub build_count: usize,
}

/// Process every selected app in order. The first failure ends the run;
/// records written before it stay written.
pub fn run(
    config: &GenCiBuildConfig,
    request: &RunRequest,
    fs: &dyn FileSystem,
    vcs: &dyn VersionControl,
) -> Result<Vec<AppendedBuild>, GenCiBuildError> {
    config.validate()?;

    if config.sdk_path.is_none() {
        warn!("ANDROID_HOME is not set");
    }
    if config.commit.is_none() {
        warn!("CI_COMMIT_SHA is not set; new builds will have no commit");
    }

    let universe = read_metadata(fs, config, request.policy)?;
    let selected = resolve_apps(&request.apps, universe)?;
    info!("Adding CI builds to {} app(s)", selected.len());

    let mut appended = Vec::with_capacity(selected.len());
    for resolved in selected {
        let mut record = resolved.record;

        let descriptor = derive_version(fs, vcs, config)?;
        let repo = local_repo_uri(fs, &config.source_root)?;
        let build = append_ci_build(
            &mut record,
            resolved.template_version_code,
            &descriptor,
            config.commit.as_deref(),
            &repo,
        )?
        .clone();

        write_metadata(fs, &record)?;

        info!(
            "{}: added build {} ({}) to {}",
            record.app_id,
            build.version_code,
            build.version_name,
            record.metadata_path.display()
        );

        appended.push(AppendedBuild {
            app_id: record.app_id.clone(),
            metadata_path: record.metadata_path.clone(),
            version_name: build.version_name,
            version_code: build.version_code,
            commit: build.commit,
            repo,
            build_count: record.builds.len(),
        });
    }

    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeriveError, ResolveError};
    use crate::fs::MockFileSystem;
    use crate::metadata::{load_record, MetadataFormat};
    use crate::version::MockVersionControl;
    use std::path::Path;

    const ROOT: &str = "/builds/example/fdroid";

    const APP: &str = r#"Categories:
- Development
License: GPL-3.0-or-later
RepoType: git
Repo: https://gitlab.com/example/app.git
Builds:
- versionName: 0.9.0
  versionCode: 90
  commit: v0.9.0
  subdir: app
  gradle:
  - fdroid
AutoUpdateMode: None
UpdateCheckMode: Tags
"#;

    fn config() -> GenCiBuildConfig {
        GenCiBuildConfig {
            sdk_path: Some(PathBuf::from("/opt/android-sdk")),
            metadata_dir: PathBuf::from("metadata"),
            build_file: PathBuf::from("../app/build.gradle"),
            source_root: PathBuf::from(".."),
            commit: Some("f00dfeed".to_string()),
            accepted_formats: vec![MetadataFormat::Yaml],
            log_level: "info".to_string(),
        }
    }

    fn workspace() -> MockFileSystem {
        let fs = MockFileSystem::with_root(PathBuf::from(ROOT));
        fs.add_file("metadata/org.example.app.yml", APP);
        fs.add_file("metadata/org.example.other.yml", APP);
        fs.add_file(
            "../app/build.gradle",
            "android {\n    defaultConfig {\n        versionCode 95\n    }\n}\n",
        );
        fs
    }

    fn git(described: &'static str) -> MockVersionControl {
        let mut vcs = MockVersionControl::new();
        vcs.expect_describe()
            .returning(move |_| Ok(described.to_string()));
        vcs
    }

    fn request(apps: &[&str]) -> RunRequest {
        RunRequest {
            apps: apps.iter().map(|s| s.to_string()).collect(),
            policy: MetadataPolicy::Error,
        }
    }

    #[test]
    fn test_run_appends_ci_build() {
        let fs = workspace();

        let appended = run(&config(), &request(&["org.example.app"]), &fs, &git("v0.9.0-5-g1234abc")).unwrap();

        assert_eq!(
            appended,
            vec![AppendedBuild {
                app_id: "org.example.app".to_string(),
                metadata_path: PathBuf::from(format!("{}/metadata/org.example.app.yml", ROOT)),
                version_name: "0.9.0-5-g1234abc".to_string(),
                version_code: 95,
                commit: Some("f00dfeed".to_string()),
                repo: "file:///builds/example".to_string(),
                build_count: 2,
            }]
        );

        let expected = APP
            .replace("https://gitlab.com/example/app.git", "file:///builds/example")
            .replace(
                "AutoUpdateMode",
                "- versionName: 0.9.0-5-g1234abc\n  versionCode: 95\n  commit: f00dfeed\n  subdir: app\n  gradle:\n  - fdroid\nAutoUpdateMode",
            );
        assert_eq!(fs.contents("metadata/org.example.app.yml").unwrap(), expected);
        assert_eq!(fs.contents("metadata/org.example.other.yml").unwrap(), APP);
    }

    #[test]
    fn test_written_record_reloads_identically() {
        let fs = workspace();
        run(&config(), &request(&["org.example.app"]), &fs, &git("v1.0")).unwrap();

        let path = Path::new("metadata/org.example.app.yml");
        let first = load_record(&fs, "org.example.app", path, MetadataFormat::Yaml).unwrap();
        crate::metadata::write_metadata(&fs, &first).unwrap();
        let second = load_record(&fs, "org.example.app", path, MetadataFormat::Yaml).unwrap();

        assert_eq!(first.builds, second.builds);
        let codes: Vec<u64> = second.builds.iter().map(|b| b.version_code).collect();
        assert_eq!(codes, vec![90, 95]);
    }

    #[test]
    fn test_run_without_arguments_processes_all_apps() {
        let fs = workspace();

        let appended = run(&config(), &request(&[]), &fs, &git("v1.0")).unwrap();
        let ids: Vec<&str> = appended.iter().map(|a| a.app_id.as_str()).collect();

        assert_eq!(ids, vec!["org.example.app", "org.example.other"]);
        assert_ne!(fs.contents("metadata/org.example.other.yml").unwrap(), APP);
    }

    #[test]
    fn test_unset_commit_is_left_out() {
        let fs = workspace();
        let config = GenCiBuildConfig {
            commit: None,
            ..config()
        };

        let appended = run(&config, &request(&["org.example.app"]), &fs, &git("v1.0")).unwrap();
        assert_eq!(appended[0].commit, None);

        let record = load_record(
            &fs,
            "org.example.app",
            Path::new("metadata/org.example.app.yml"),
            MetadataFormat::Yaml,
        )
        .unwrap();
        assert!(record.builds[1].commit.is_none());
    }

    #[test]
    fn test_unknown_app_writes_nothing() {
        let fs = workspace();

        let err = run(&config(), &request(&["org.example.app", "org.example.nope"]), &fs, &git("v1.0"))
            .unwrap_err();

        assert!(matches!(err, GenCiBuildError::Resolve(ResolveError::UnknownApp(_))));
        assert_eq!(fs.contents("metadata/org.example.app.yml").unwrap(), APP);
    }

    #[test]
    fn test_missing_version_code_writes_nothing() {
        let fs = workspace();
        fs.add_file("../app/build.gradle", "android {}\n");

        let err = run(&config(), &request(&[]), &fs, &git("v1.0")).unwrap_err();

        assert!(matches!(
            err,
            GenCiBuildError::Derive(DeriveError::VersionCodeNotFound(_))
        ));
        assert_eq!(fs.contents("metadata/org.example.app.yml").unwrap(), APP);
        assert_eq!(fs.contents("metadata/org.example.other.yml").unwrap(), APP);
    }

    #[test]
    fn test_failure_aborts_remaining_apps() {
        let fs = workspace();
        fs.add_file("metadata/org.example.zzz.yml", "License: MIT\n");

        let err = run(&config(), &request(&[]), &fs, &git("v1.0")).unwrap_err();

        assert!(matches!(err, GenCiBuildError::Synthesize(_)));
        assert_ne!(fs.contents("metadata/org.example.app.yml").unwrap(), APP);
        assert_eq!(
            fs.contents("metadata/org.example.zzz.yml").unwrap(),
            "License: MIT\n"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let fs = workspace();
        let config = GenCiBuildConfig {
            accepted_formats: Vec::new(),
            ..config()
        };

        let err = run(&config, &request(&[]), &fs, &git("v1.0")).unwrap_err();
        assert!(matches!(err, GenCiBuildError::Config(_)));
    }
}
