use std::path::PathBuf;
use thiserror::Error;

/// Failures while mapping command-line app ids onto the loaded metadata.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid app argument '{0}': expected APPID or APPID:VERSIONCODE")]
    InvalidArgument(String),

    #[error("No such package: {}", .0.join(", "))]
    UnknownApp(Vec<String>),

    #[error("No such versionCode {version_code} for app {app_id}")]
    UnknownVersionCode { app_id: String, version_code: u64 },

    #[error("App {0} given more than once; only one CI build per app can be added")]
    DuplicateApp(String),

    #[error("No metadata records found")]
    NoApps,
}

/// Failures while computing the version name and version code.
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Failed to run '{command}': {message}")]
    ToolExecution { command: String, message: String },

    #[error("'{0}' produced no output")]
    EmptyDescribe(String),

    #[error("Build file not found: {}", .0.display())]
    BuildFileMissing(PathBuf),

    #[error("Failed to read build file {}: {message}", .path.display())]
    BuildFileRead { path: PathBuf, message: String },

    #[error("No versionCode declaration found in {}", .0.display())]
    VersionCodeNotFound(PathBuf),

    #[error("Invalid versionCode '{value}' in {}", .path.display())]
    InvalidVersionCode { path: PathBuf, value: String },
}

/// Failures while cloning the template build and pointing the app at the local checkout.
#[derive(Debug, Error)]
pub enum SynthesizeError {
    #[error("App {0} has no builds to use as a template")]
    EmptyBuildHistory(String),

    #[error("App {app_id} has no build with versionCode {version_code}")]
    MissingTemplate { app_id: String, version_code: u64 },

    #[error("Cannot use {} as source repository: {message}", .path.display())]
    SourceRoot { path: PathBuf, message: String },
}

/// Failures reading or writing metadata records.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Unsupported metadata format for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid field '{field}' in {}: {message}", .path.display())]
    InvalidField {
        path: PathBuf,
        field: String,
        message: String,
    },

    #[error("Found multiple metadata files for {app_id}: {}", display_paths(.paths))]
    MultipleRecords { app_id: String, paths: Vec<PathBuf> },

    #[error("Failed to serialize {}: {message}", .path.display())]
    Serialize { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Any failure that aborts a run.
#[derive(Debug, Error)]
pub enum GenCiBuildError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Synthesize(#[from] SynthesizeError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),
}
