use crate::error::DeriveError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Source of the human readable version of the current checkout.
#[cfg_attr(test, mockall::automock)]
pub trait VersionControl {
    /// Nearest tag, or tag plus distance and hash, or a bare hash when no tag is reachable.
    fn describe(&self, workdir: &Path) -> Result<String, DeriveError>;
}

/// `git describe --tags --always`, run synchronously in `workdir`.
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command_line(&self) -> String {
        format!("{} describe --tags --always", self.program)
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for GitCli {
    fn describe(&self, workdir: &Path) -> Result<String, DeriveError> {
        debug!("Running '{}' in {}", self.command_line(), workdir.display());

        let output = Command::new(&self.program)
            .args(["describe", "--tags", "--always"])
            .current_dir(workdir)
            .output()
            .map_err(|e| DeriveError::ToolExecution {
                command: self.command_line(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeriveError::ToolExecution {
                command: self.command_line(),
                message: format!("{} ({})", stderr.trim(), output.status),
            });
        }

        let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if described.is_empty() {
            return Err(DeriveError::EmptyDescribe(self.command_line()));
        }

        Ok(described)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_binary_is_a_tool_error() {
        let dir = TempDir::new().unwrap();
        let git = GitCli::with_program("gencibuild-no-such-vcs");

        let err = git.describe(dir.path()).unwrap_err();
        assert!(matches!(err, DeriveError::ToolExecution { .. }));
        assert!(err.to_string().contains("gencibuild-no-such-vcs describe"));
    }

    #[test]
    fn test_command_line() {
        assert_eq!(GitCli::new().command_line(), "git describe --tags --always");
    }
}
