use crate::metadata::MetadataFormat;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_METADATA_DIR: &str = "metadata";
const DEFAULT_BUILD_FILE: &str = "../app/build.gradle";
const DEFAULT_SOURCE_ROOT: &str = "..";
const DEFAULT_ACCEPTED_FORMATS: &str = "yml";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Settings for one run, built once at startup and passed down by reference.
#[derive(Debug, Clone)]
pub struct GenCiBuildConfig {
    /// Android SDK location, only reported; nothing here invokes the SDK.
    pub sdk_path: Option<PathBuf>,
    /// Directory holding one metadata record per app.
    pub metadata_dir: PathBuf,
    /// Gradle build script scanned for the versionCode declaration.
    pub build_file: PathBuf,
    /// Checkout the new build is made from; becomes the app's `Repo`.
    pub source_root: PathBuf,
    /// Commit recorded in the new build, as provided by CI.
    pub commit: Option<String>,
    pub accepted_formats: Vec<MetadataFormat>,
    pub log_level: String,
}

impl Default for GenCiBuildConfig {
    fn default() -> Self {
        let sdk_path = env::var("ANDROID_HOME").ok().map(PathBuf::from);

        let metadata_dir = env::var("GENCIBUILD_METADATA_DIR")
            .unwrap_or_else(|_| DEFAULT_METADATA_DIR.to_string())
            .into();

        let build_file = env::var("GENCIBUILD_BUILD_FILE")
            .unwrap_or_else(|_| DEFAULT_BUILD_FILE.to_string())
            .into();

        let source_root = env::var("GENCIBUILD_SOURCE_ROOT")
            .unwrap_or_else(|_| DEFAULT_SOURCE_ROOT.to_string())
            .into();

        let commit = env::var("CI_COMMIT_SHA").ok();

        // Unknown entries are dropped here; validate() rejects an empty result.
        let accepted_formats = env::var("GENCIBUILD_ACCEPTED_FORMATS")
            .unwrap_or_else(|_| DEFAULT_ACCEPTED_FORMATS.to_string())
            .split(',')
            .filter_map(|s| s.trim().parse::<MetadataFormat>().ok())
            .collect();

        let log_level = env::var("GENCIBUILD_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            sdk_path,
            metadata_dir,
            build_file,
            source_root,
            commit,
            accepted_formats,
            log_level,
        }
    }
}

impl GenCiBuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metadata_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Metadata directory must not be empty".to_string(),
            ));
        }

        if self.build_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Build file path must not be empty".to_string(),
            ));
        }

        if self.source_root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Source root must not be empty".to_string(),
            ));
        }

        if self.accepted_formats.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "At least one accepted metadata format is required (yml, json)".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn accepts(&self, format: MetadataFormat) -> bool {
        self.accepted_formats.contains(&format)
    }
}

/// Parse a comma separated format list such as `yml,json`.
pub fn parse_accepted_formats(value: &str) -> Result<Vec<MetadataFormat>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<MetadataFormat>()
                .map_err(|error| ConfigError::ParseError {
                    field: "accepted_formats".to_string(),
                    error,
                })
        })
        .collect()
}

impl fmt::Display for GenCiBuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "gencibuild Configuration:")?;
        match &self.sdk_path {
            Some(path) => writeln!(f, "  SDK Path: {}", path.display())?,
            None => writeln!(f, "  SDK Path: (unset)")?,
        }
        writeln!(f, "  Metadata Dir: {}", self.metadata_dir.display())?;
        writeln!(f, "  Build File: {}", self.build_file.display())?;
        writeln!(f, "  Source Root: {}", self.source_root.display())?;
        writeln!(
            f,
            "  Commit: {}",
            self.commit.as_deref().unwrap_or("(unset)")
        )?;
        let formats: Vec<&str> = self.accepted_formats.iter().map(|f| f.extension()).collect();
        writeln!(f, "  Accepted Formats: {}", formats.join(", "))?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
