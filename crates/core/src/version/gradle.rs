//! Finding the versionCode declared in a Gradle build script.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Matches `versionCode 42`, `versionCode = 42`, `versionCode(42)`,
/// `versionCode "42"` and `VersionCode = 1_000`; group 1 is the number.
pub const VERSION_CODE_PATTERN: &str = r#"\b[Vv]ersionCode\s*=?\s*["'(]*([0-9][0-9_]*)["')]*"#;

fn version_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_CODE_PATTERN).expect("version code pattern is valid"))
}

/// The captured digits of the versionCode declaration on `line`, if any.
pub fn match_version_code(line: &str) -> Option<&str> {
    version_code_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Scan every line and return the digits of the last matching declaration.
///
/// Later declarations win, the way a later assignment wins when Gradle
/// evaluates the script.
pub fn scan_version_code(text: &str) -> Option<String> {
    let mut found: Option<&str> = None;

    for line in text.lines() {
        if let Some(digits) = match_version_code(line) {
            if let Some(previous) = found {
                if previous != digits {
                    warn!(
                        "Multiple versionCode declarations ({} then {}), using the last one",
                        previous, digits
                    );
                }
            }
            found = Some(digits);
        }
    }

    found.map(|digits| digits.replace('_', ""))
}
