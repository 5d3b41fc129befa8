//! Run summary in JSON, YAML or human-readable text.

use anyhow::{Context, Result};
use gencibuild_core::AppendedBuild;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, builds: &[AppendedBuild]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(builds)
                .context("Failed to serialize run summary to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(builds).context("Failed to serialize run summary to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(builds)),
        }
    }

    fn format_human(&self, builds: &[AppendedBuild]) -> String {
        let mut out = String::new();

        for build in builds {
            out.push_str(&format!("{}\n", build.app_id));
            out.push_str(&format!("  Version:  {} ({})\n", build.version_name, build.version_code));
            out.push_str(&format!(
                "  Commit:   {}\n",
                build.commit.as_deref().unwrap_or("(none)")
            ));
            out.push_str(&format!("  Repo:     {}\n", build.repo));
            out.push_str(&format!(
                "  Metadata: {} ({} builds)\n",
                build.metadata_path.display(),
                build.build_count
            ));
        }

        out.push_str(&format!("Added {} CI build(s)", builds.len()));
        out
    }
}
