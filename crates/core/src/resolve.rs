//! Selecting which records a run touches.

use crate::error::ResolveError;
use crate::metadata::ApplicationRecord;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A parsed `APPID[:VERSIONCODE]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppArg {
    pub app_id: String,
    pub version_code: Option<u64>,
}

/// A record selected for processing.
#[derive(Debug, Clone)]
pub struct ResolvedApp {
    pub record: ApplicationRecord,
    /// Build to clone instead of the most recent one.
    pub template_version_code: Option<u64>,
}

pub fn parse_app_arg(arg: &str) -> Result<AppArg, ResolveError> {
    let invalid = || ResolveError::InvalidArgument(arg.to_string());

    let (app_id, version_code) = match arg.split_once(':') {
        Some((app_id, code)) => {
            let code = code.parse::<u64>().map_err(|_| invalid())?;
            (app_id, Some(code))
        }
        None => (arg, None),
    };

    if app_id.is_empty() || app_id.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(AppArg {
        app_id: app_id.to_string(),
        version_code,
    })
}

/// Pick the records named by `args`, or every record when `args` is empty.
///
/// Results come back in app id order regardless of argument order.
pub fn resolve_apps(
    args: &[String],
    mut universe: BTreeMap<String, ApplicationRecord>,
) -> Result<Vec<ResolvedApp>, ResolveError> {
    if args.is_empty() {
        if universe.is_empty() {
            return Err(ResolveError::NoApps);
        }
        return Ok(universe
            .into_values()
            .map(|record| ResolvedApp {
                record,
                template_version_code: None,
            })
            .collect());
    }

    let mut requested: BTreeMap<String, Option<u64>> = BTreeMap::new();
    for arg in args {
        let parsed = parse_app_arg(arg)?;
        if requested.contains_key(&parsed.app_id) {
            return Err(ResolveError::DuplicateApp(parsed.app_id));
        }
        requested.insert(parsed.app_id, parsed.version_code);
    }

    let unknown: BTreeSet<&String> = requested
        .keys()
        .filter(|id| !universe.contains_key(*id))
        .collect();
    if !unknown.is_empty() {
        return Err(ResolveError::UnknownApp(
            unknown.into_iter().cloned().collect(),
        ));
    }

    let mut resolved = Vec::with_capacity(requested.len());
    for (app_id, version_code) in requested {
        let Some(record) = universe.remove(&app_id) else {
            continue;
        };

        if let Some(code) = version_code {
            if record.build_by_version_code(code).is_none() {
                return Err(ResolveError::UnknownVersionCode {
                    app_id,
                    version_code: code,
                });
            }
            debug!("{}: using build {} as template", app_id, code);
        }

        resolved.push(ResolvedApp {
            record,
            template_version_code: version_code,
        });
    }

    Ok(resolved)
}
