//! Version name and version code of the checkout being built.

mod gradle;
mod vcs;

pub use gradle::{match_version_code, scan_version_code, VERSION_CODE_PATTERN};
#[cfg(test)]
pub use vcs::MockVersionControl;
pub use vcs::{GitCli, VersionControl};

use crate::config::GenCiBuildConfig;
use crate::error::DeriveError;
use crate::fs::FileSystem;
use std::path::Path;
use tracing::debug;

/// Version identifiers for the build being added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version_name: String,
    pub version_code: u64,
}

/// Drop the single marker character tags carry (`v2.3.1` -> `2.3.1`).
///
/// Output that already starts with a digit is returned as is. An untagged
/// checkout describes as a bare hash, which loses its first character when
/// that is a letter (`a1b2c3d` -> `1b2c3d`) and is kept whole otherwise.
pub fn version_name_from_describe(described: &str) -> String {
    let described = described.trim();
    match described.chars().next() {
        Some(c) if !c.is_ascii_digit() => described[c.len_utf8()..].to_string(),
        _ => described.to_string(),
    }
}

pub fn version_code_from_build_file(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<u64, DeriveError> {
    if !fs.is_file(path) {
        return Err(DeriveError::BuildFileMissing(path.to_path_buf()));
    }

    let text = fs.read_to_string(path).map_err(|e| DeriveError::BuildFileRead {
        path: path.to_path_buf(),
        message: format!("{:#}", e),
    })?;

    let digits = scan_version_code(&text)
        .ok_or_else(|| DeriveError::VersionCodeNotFound(path.to_path_buf()))?;

    digits
        .parse::<u64>()
        .map_err(|_| DeriveError::InvalidVersionCode {
            path: path.to_path_buf(),
            value: digits.clone(),
        })
}

pub fn derive_version(
    fs: &dyn FileSystem,
    vcs: &dyn VersionControl,
    config: &GenCiBuildConfig,
) -> Result<VersionDescriptor, DeriveError> {
    let described = vcs.describe(&config.source_root)?;
    let version_name = version_name_from_describe(&described);
    let version_code = version_code_from_build_file(fs, &config.build_file)?;

    debug!(
        "Derived versionName {} (from '{}') and versionCode {} (from {})",
        version_name,
        described,
        version_code,
        config.build_file.display()
    );

    Ok(VersionDescriptor {
        version_name,
        version_code,
    })
}
