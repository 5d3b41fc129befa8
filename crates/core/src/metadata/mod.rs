//! Reading and writing per-app metadata records.
//!
//! Records live one per file in the metadata directory and are named after
//! the app id (`metadata/org.example.app.yml`). A record is always written
//! back to the path and format it was read from, with its existing text left
//! as it was wherever the layout allows.

mod app;
mod build;
mod format;
mod splice;

pub use app::ApplicationRecord;
pub use build::BuildEntry;
pub use format::MetadataFormat;

use crate::config::GenCiBuildConfig;
use crate::error::MetadataError;
use crate::fs::FileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do with a record that fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataPolicy {
    #[default]
    Error,
    Warn,
    Ignore,
}

/// Load every accepted record in the metadata directory, keyed by app id.
pub fn read_metadata(
    fs: &dyn FileSystem,
    config: &GenCiBuildConfig,
    policy: MetadataPolicy,
) -> Result<BTreeMap<String, ApplicationRecord>, MetadataError> {
    let dir = &config.metadata_dir;
    if !fs.is_dir(dir) {
        return Err(MetadataError::Read {
            path: dir.clone(),
            message: "metadata directory not found".to_string(),
        });
    }
    let entries = fs.read_dir(dir).map_err(|e| MetadataError::Read {
        path: dir.clone(),
        message: format!("{:#}", e),
    })?;

    let mut candidates: BTreeMap<String, Vec<(PathBuf, MetadataFormat)>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.is_file()) {
        let Some(format) = MetadataFormat::from_path(entry.path()) else {
            continue;
        };
        if !config.accepts(format) {
            debug!("Skipping {} ({} not accepted)", entry.path().display(), format);
            continue;
        }
        let Some(app_id) = entry.path().file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        candidates
            .entry(app_id.to_string())
            .or_default()
            .push((entry.path().to_path_buf(), format));
    }

    let mut apps = BTreeMap::new();
    for (app_id, mut files) in candidates {
        if files.len() > 1 {
            files.sort_by(|a, b| a.0.cmp(&b.0));
            return Err(MetadataError::MultipleRecords {
                app_id,
                paths: files.into_iter().map(|(p, _)| p).collect(),
            });
        }
        let (path, format) = files.remove(0);

        match load_record(fs, &app_id, &path, format) {
            Ok(record) => {
                debug!(
                    "Loaded {} with {} builds from {}",
                    app_id,
                    record.builds.len(),
                    path.display()
                );
                apps.insert(app_id, record);
            }
            Err(e) => match policy {
                MetadataPolicy::Error => return Err(e),
                MetadataPolicy::Warn => warn!("Skipping {}: {}", app_id, e),
                MetadataPolicy::Ignore => debug!("Ignoring {}: {}", app_id, e),
            },
        }
    }

    debug!("Loaded {} metadata records from {}", apps.len(), dir.display());
    Ok(apps)
}

pub fn load_record(
    fs: &dyn FileSystem,
    app_id: &str,
    path: &Path,
    format: MetadataFormat,
) -> Result<ApplicationRecord, MetadataError> {
    let text = fs.read_to_string(path).map_err(|e| MetadataError::Read {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    })?;
    let document = format.parse(path, &text)?;
    ApplicationRecord::from_document(app_id, path, format, document).map(|r| r.with_source(text))
}

/// Serialize `record` over the file it came from, in that file's format.
pub fn write_metadata(fs: &dyn FileSystem, record: &ApplicationRecord) -> Result<(), MetadataError> {
    let path = &record.metadata_path;
    let format = MetadataFormat::from_path(path)
        .ok_or_else(|| MetadataError::UnsupportedFormat(path.clone()))?;

    let text = record.render(format)?;

    fs.write_string(path, &text).map_err(|e| MetadataError::Write {
        path: path.clone(),
        message: format!("{:#}", e),
    })?;

    debug!("Wrote {} ({} builds)", path.display(), record.builds.len());
    Ok(())
}
