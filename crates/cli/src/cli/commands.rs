use clap::{Parser, ValueEnum};
use gencibuild_core::config::{parse_accepted_formats, ConfigError, GenCiBuildConfig};
use gencibuild_core::{MetadataPolicy, RunRequest};
use std::path::PathBuf;

/// Add a build entry for the current CI commit to app metadata
#[derive(Parser, Debug)]
#[command(
    name = "gencibuild",
    about = "Add a build entry for the current CI commit to app metadata",
    version,
    long_about = "gencibuild clones the most recent build entry of each selected app, sets its \
                  versionName from `git describe`, its versionCode from the Gradle build file and \
                  its commit from CI_COMMIT_SHA, points the app's Repo at the local checkout and \
                  writes the metadata record back in place.\n\n\
                  Examples:\n  \
                  gencibuild\n  \
                  gencibuild org.example.app\n  \
                  gencibuild org.example.app:1040 --format json"
)]
pub struct CliArgs {
    #[arg(
        value_name = "APPID[:VERSIONCODE]",
        help = "applicationId with optional versionCode of the build to clone (default: all apps)"
    )]
    pub apps: Vec<String>,

    #[arg(long, value_name = "DIR", help = "Directory holding the metadata records")]
    pub metadata_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Gradle build file declaring the versionCode"
    )]
    pub build_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Checkout the build is made from; becomes the app's Repo"
    )]
    pub source_root: Option<PathBuf>,

    #[arg(long, value_name = "SHA", help = "Commit to record (overrides CI_COMMIT_SHA)")]
    pub commit: Option<String>,

    #[arg(
        long,
        value_name = "FORMATS",
        help = "Comma separated metadata formats to read (yml, json)"
    )]
    pub accepted_formats: Option<String>,

    #[arg(
        short = 'W',
        long = "metadata-errors",
        value_enum,
        default_value = "error",
        help = "Treat malformed metadata records as errors, warnings, or ignore them"
    )]
    pub metadata_errors: MetadataPolicyArg,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Summary output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        long,
        value_enum,
        default_value = "text",
        help = "Log output format"
    )]
    pub log_format: LogFormatArg,

    #[arg(short = 'v', long, help = "Show debug output")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of the environment-derived config.
    pub fn apply_to(&self, base: GenCiBuildConfig) -> Result<GenCiBuildConfig, ConfigError> {
        let accepted_formats = match &self.accepted_formats {
            Some(formats) => parse_accepted_formats(formats)?,
            None => base.accepted_formats,
        };

        Ok(GenCiBuildConfig {
            metadata_dir: self.metadata_dir.clone().unwrap_or(base.metadata_dir),
            build_file: self.build_file.clone().unwrap_or(base.build_file),
            source_root: self.source_root.clone().unwrap_or(base.source_root),
            commit: self.commit.clone().or(base.commit),
            accepted_formats,
            log_level: self
                .log_level
                .as_ref()
                .map(|l| l.to_lowercase())
                .unwrap_or(base.log_level),
            ..base
        })
    }

    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            apps: self.apps.clone(),
            policy: self.metadata_errors.into(),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataPolicyArg {
    Error,
    Warn,
    Ignore,
}

impl From<MetadataPolicyArg> for MetadataPolicy {
    fn from(arg: MetadataPolicyArg) -> Self {
        match arg {
            MetadataPolicyArg::Error => MetadataPolicy::Error,
            MetadataPolicyArg::Warn => MetadataPolicy::Warn,
            MetadataPolicyArg::Ignore => MetadataPolicy::Ignore,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Text,
    Json,
}
