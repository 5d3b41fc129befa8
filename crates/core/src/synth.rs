//! Building the new CI entry from an existing one.

use crate::error::SynthesizeError;
use crate::fs::FileSystem;
use crate::metadata::{ApplicationRecord, BuildEntry};
use crate::version::VersionDescriptor;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Copy `template` with the version fields and commit replaced.
pub fn synthesize_build(
    template: &BuildEntry,
    descriptor: &VersionDescriptor,
    commit: Option<&str>,
) -> BuildEntry {
    BuildEntry {
        version_name: descriptor.version_name.clone(),
        version_code: descriptor.version_code,
        commit: commit.map(str::to_string),
        ..template.clone()
    }
}

/// `file://` URI of the canonicalised `source_root`.
pub fn local_repo_uri(fs: &dyn FileSystem, source_root: &Path) -> Result<String, SynthesizeError> {
    let path = fs
        .canonicalize(source_root)
        .map_err(|e| SynthesizeError::SourceRoot {
            path: source_root.to_path_buf(),
            message: format!("{:#}", e),
        })?;

    Url::from_file_path(&path)
        .map(String::from)
        .map_err(|_| SynthesizeError::SourceRoot {
            path: path.clone(),
            message: "not an absolute path".to_string(),
        })
}

/// Append a CI build to `record` and point its `Repo` at `repo_uri`.
///
/// The template is the build with `template_version_code`, or the last build
/// when none is given. Returns the appended entry.
pub fn append_ci_build<'a>(
    record: &'a mut ApplicationRecord,
    template_version_code: Option<u64>,
    descriptor: &VersionDescriptor,
    commit: Option<&str>,
    repo_uri: &str,
) -> Result<&'a BuildEntry, SynthesizeError> {
    let template = match template_version_code {
        Some(code) => record
            .build_by_version_code(code)
            .ok_or_else(|| SynthesizeError::MissingTemplate {
                app_id: record.app_id.clone(),
                version_code: code,
            })?,
        None => record
            .last_build()
            .ok_or_else(|| SynthesizeError::EmptyBuildHistory(record.app_id.clone()))?,
    };

    if let Some(latest) = record.builds.iter().map(|b| b.version_code).max() {
        if descriptor.version_code <= latest {
            warn!(
                "{}: new versionCode {} is not above existing {}",
                record.app_id, descriptor.version_code, latest
            );
        }
    }

    let build = synthesize_build(template, descriptor, commit);
    debug!(
        "{}: cloned build {} into {} ({})",
        record.app_id, template.version_code, build.version_code, build.version_name
    );

    record.set_repo(repo_uri);
    let index = record.builds.len();
    record.builds.push(build);

    Ok(&record.builds[index])
}
