// Prerequisite checks.
//
// Path-shape validators gate the offline sources before anything on the host
// is touched; the system checks verify privileges and tooling before the
// bootstrap starts.

use crate::error::{InstallerError, Result};
use crate::installers::collections::COLLECTION_ARCHIVE_SUFFIXES;
use crate::installers::package_manager::PackageManager;
use crate::installers::runtime_env::RUNTIME_ARTIFACT_SUFFIXES;
use crate::libs::paths::MANIFEST_FILE_NAME;
use crate::libs::utilities::file_operations::{dir_has_entries, files_with_suffix};
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::schemas::config::{CollectionSource, OfflineSources};
use crate::{log_error, log_info};
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;

pub const CONNECTIVITY_PROBE: &str = "8.8.8.8:53";
pub const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

fn invalid(path: &Path, reason: impl Into<String>) -> InstallerError {
    InstallerError::PrerequisiteValidation {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn require_existing(path: &Path, what: &str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(invalid(path, format!("{what} does not exist")))
    }
}

/// A collections staging directory must exist and hold something.
pub fn check_collections_dir(path: &Path) -> Result<()> {
    require_existing(path, "collections path")?;
    let has_entries = dir_has_entries(path).map_err(|e| invalid(path, format!("cannot read collections directory: {e}")))?;
    if !has_entries {
        return Err(invalid(path, "collections directory is empty"));
    }
    log_info!("[Prerequisites] Collections path {} looks usable", path.display());
    Ok(())
}

/// A tarball path is either one archive or a directory with at least one.
pub fn check_tarball_path(path: &Path) -> Result<()> {
    require_existing(path, "tarball path")?;
    if path.is_dir() {
        let archives = files_with_suffix(path, COLLECTION_ARCHIVE_SUFFIXES)
            .map_err(|e| invalid(path, format!("cannot read tarball directory: {e}")))?;
        if archives.is_empty() {
            return Err(invalid(path, "no tarball files found in directory"));
        }
    } else {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if !COLLECTION_ARCHIVE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            return Err(invalid(path, "file is not a tarball (.tar.gz or .tgz)"));
        }
    }
    log_info!("[Prerequisites] Tarball path {} looks usable", path.display());
    Ok(())
}

/// A requirements directory needs its manifest and at least one package,
/// in that order: a missing manifest is reported even when packages are there.
pub fn check_requirements_dir(path: &Path) -> Result<()> {
    require_existing(path, "requirements path")?;
    let manifest = path.join(MANIFEST_FILE_NAME);
    if !manifest.is_file() {
        return Err(invalid(&manifest, format!("{MANIFEST_FILE_NAME} not found")));
    }
    let packages = files_with_suffix(path, RUNTIME_ARTIFACT_SUFFIXES)
        .map_err(|e| invalid(path, format!("cannot read requirements directory: {e}")))?;
    if packages.is_empty() {
        return Err(invalid(path, "no Python packages found in requirements directory"));
    }
    log_info!("[Prerequisites] Requirements path {} holds {} packages", path.display(), packages.len());
    Ok(())
}

pub fn check_core_vars_path(path: &Path) -> Result<()> {
    require_existing(path, "core variables path")
}

/// Validates every supplied offline source.
pub fn check_offline_sources(sources: &OfflineSources) -> Result<()> {
    match &sources.collections {
        CollectionSource::Directory(dir) => check_collections_dir(dir)?,
        CollectionSource::Tarball(path) => check_tarball_path(path)?,
    }
    if let Some(requirements) = &sources.requirements {
        check_requirements_dir(requirements)?;
    }
    if let Some(core_vars) = &sources.core_vars {
        check_core_vars_path(core_vars)?;
    }
    Ok(())
}

/// One named host check.
pub struct SystemCheck {
    pub name: &'static str,
    pub run: fn(&dyn CommandRunner) -> std::result::Result<(), String>,
}

pub fn check_root(runner: &dyn CommandRunner) -> std::result::Result<(), String> {
    let uid = run_checked(runner, &Invocation::new("id").arg("-u"))?;
    if uid.trim() == "0" {
        Ok(())
    } else {
        Err(format!("root access required (effective uid {})", uid.trim()))
    }
}

pub fn check_python3(runner: &dyn CommandRunner) -> std::result::Result<(), String> {
    if runner.program_available("python3") {
        Ok(())
    } else {
        Err("python3 not found in PATH".to_string())
    }
}

pub fn check_package_manager(runner: &dyn CommandRunner) -> std::result::Result<(), String> {
    PackageManager::detect(runner).map(|_| ()).map_err(|e| e.to_string())
}

pub fn check_internet(_runner: &dyn CommandRunner) -> std::result::Result<(), String> {
    let addr: SocketAddr = CONNECTIVITY_PROBE
        .parse()
        .map_err(|e| format!("invalid probe address: {e}"))?;
    TcpStream::connect_timeout(&addr, CONNECTIVITY_TIMEOUT)
        .map(|_| ())
        .map_err(|e| format!("no internet connectivity detected: {e}"))
}

/// Checks for an online run; offline runs drop the connectivity probe.
pub fn system_checks(online: bool) -> Vec<SystemCheck> {
    let mut checks = vec![
        SystemCheck { name: "root access", run: check_root },
        SystemCheck { name: "python3", run: check_python3 },
        SystemCheck { name: "package manager", run: check_package_manager },
    ];
    if online {
        checks.push(SystemCheck { name: "internet connectivity", run: check_internet });
    }
    checks
}

/// Runs the checks in order, printing `Checking <name>... OK|FAILED` for
/// each, and stops at the first failure.
pub fn run_system_checks(runner: &dyn CommandRunner, checks: &[SystemCheck]) -> Result<()> {
    for check in checks {
        print!("Checking {}... ", check.name);
        let _ = std::io::stdout().flush();
        match (check.run)(runner) {
            Ok(()) => {
                println!("OK");
                log_info!("[Prerequisites] {} check passed", check.name);
            }
            Err(reason) => {
                println!("FAILED: {reason}");
                log_error!("[Prerequisites] {} check failed: {}", check.name, reason);
                return Err(InstallerError::SystemCheck {
                    check: check.name,
                    reason,
                });
            }
        }
    }
    log_info!("[Prerequisites] All system checks passed");
    Ok(())
}
