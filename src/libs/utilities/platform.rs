// OS fingerprinting.
//
// Reads the host's platform descriptor (`/etc/os-release`), extracts the raw
// `ID` and `VERSION_ID`, and normalizes both into the canonical identity used
// as the lookup key of the platform table and of the interpreter selection.

use crate::error::{InstallerError, Result};
use crate::{log_debug, log_warn};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Canonical (family, version) pair of the running host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsIdentity {
    pub family: String,
    pub version: String,
}

impl OsIdentity {
    pub fn new(family: impl Into<String>, version: impl Into<String>) -> Self {
        OsIdentity {
            family: family.into(),
            version: version.into(),
        }
    }

    pub fn is(&self, family: &str, version: &str) -> bool {
        self.family == family && self.version == version
    }
}

impl fmt::Display for OsIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// Reads and normalizes the descriptor at `descriptor`.
///
/// Only an unreadable file is an error here. An unknown distribution passes
/// through unchanged and is rejected later by the platform table lookup.
pub fn detect_os(descriptor: &Path) -> Result<OsIdentity> {
    let content = fs::read_to_string(descriptor).map_err(|source| InstallerError::Detection {
        path: descriptor.to_path_buf(),
        source,
    })?;
    let identity = identity_from_os_release(&content);
    log_debug!(
        "[Platform] {} resolved to {}",
        descriptor.display(),
        identity
    );
    Ok(identity)
}

/// Parses `os-release` content and normalizes it.
pub fn identity_from_os_release(content: &str) -> OsIdentity {
    let (raw_id, raw_version) = parse_os_release(content);
    let family = normalize_family(&raw_id);
    let version = normalize_version(&family, &raw_version);
    OsIdentity { family, version }
}

/// Extracts the raw `ID` and `VERSION_ID` values, quotes stripped.
/// Comment lines are skipped; a repeated key keeps its last value.
pub fn parse_os_release(content: &str) -> (String, String) {
    let mut id = String::new();
    let mut version = String::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("ID=") {
            id = unquote(value).to_string();
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version = unquote(value).to_string();
        }
    }
    (id, version)
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

/// Collapses distribution aliases onto the family tokens the table knows.
pub fn normalize_family(raw_id: &str) -> String {
    match raw_id {
        "rhel" | "centos" | "rocky" | "almalinux" => "rhel".to_string(),
        "ubuntu" => "ubuntu".to_string(),
        "debian" => "debian".to_string(),
        "opensuse-leap" | "sles" => "opensuse-leap".to_string(),
        other => {
            log_warn!("[Platform] Unknown OS id '{}', using as-is.", other);
            other.to_string()
        }
    }
}

/// RHEL-family versions are reduced to their major number ("9.3" -> "9",
/// "8 Stream" -> "8"); every other family keeps the full version string, so
/// the table carries one row per minor release for those.
pub fn normalize_version(family: &str, raw_version: &str) -> String {
    if family != "rhel" {
        return raw_version.to_string();
    }
    if raw_version.to_lowercase().contains("stream") {
        if raw_version.contains('8') {
            return "8".to_string();
        }
        if raw_version.contains('9') {
            return "9".to_string();
        }
        return raw_version.to_string();
    }
    match raw_version.split_once('.') {
        Some((major, _)) => major.to_string(),
        None => raw_version.to_string(),
    }
}
