//! PostgreSQL version and replication helpers

use crate::error::LifecycleError;
use regex::Regex;

/// Placeholder substituted in manifest templates
pub const VERSION_PLACEHOLDER: &str = "PG_VERSION";

/// Replace every `PG_VERSION` in a manifest template
pub fn render_manifest_version(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// The release one minor version below `version`, or `None` for a `.0` release
///
/// Only `major.minor` is considered; anything after is ignored.
pub fn previous_minor_version(version: &str) -> Result<Option<String>, LifecycleError> {
    let invalid = || LifecycleError::InvalidVersion(version.to_string());
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;

    Ok(minor.checked_sub(1).map(|previous| format!("{}.{}", major, previous)))
}

/// Extract the version from the output of `SELECT version();`
pub fn version_from_select(raw: &str) -> Result<String, LifecycleError> {
    let pattern = Regex::new(r"PostgreSQL\s+(\S+)")?;
    pattern
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LifecycleError::InvalidVersion(raw.to_string()))
}

/// Whether any standby reports `quorum` in `pg_stat_replication.sync_state`
pub fn in_quorum_replication<S: AsRef<str>>(sync_states: &[S]) -> bool {
    sync_states.iter().any(|state| state.as_ref().trim() == "quorum")
}
