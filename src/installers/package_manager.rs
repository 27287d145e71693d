// OS package installation.
//
// Detects which of the supported package managers the host has and turns an
// "install these packages" request into exactly one non-interactive
// invocation of it. No retries: the manager either reports success or the
// whole run stops.

use crate::error::{InstallerError, Result};
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::{log_debug, log_info};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PackageManager {
    AptGet,
    Dnf,
    Yum,
    Zypper,
}

/// Probe order: the first manager found wins.
pub const DETECTION_ORDER: [PackageManager; 4] = [
    PackageManager::AptGet,
    PackageManager::Dnf,
    PackageManager::Yum,
    PackageManager::Zypper,
];

impl PackageManager {
    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::AptGet => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Zypper => "zypper",
        }
    }

    /// Finds the first supported manager on the search path.
    pub fn detect(runner: &dyn CommandRunner) -> Result<Self> {
        for manager in DETECTION_ORDER {
            if runner.program_available(manager.binary()) {
                log_debug!("[Packages] Package manager detected: {}", manager);
                return Ok(manager);
            }
        }
        let candidates = DETECTION_ORDER
            .iter()
            .map(|m| m.binary())
            .collect::<Vec<_>>()
            .join(", ");
        Err(InstallerError::NoPackageManager { candidates })
    }

    /// The single non-interactive install command for `packages`.
    pub fn install_invocation(self, packages: &[String]) -> Invocation {
        let flags: &[&str] = match self {
            PackageManager::AptGet | PackageManager::Dnf | PackageManager::Yum => &["install", "-y"],
            PackageManager::Zypper => &["--non-interactive", "install"],
        };
        Invocation::new(self.binary()).args(flags).args(packages)
    }

    pub fn install(self, runner: &dyn CommandRunner, packages: &[String]) -> Result<()> {
        let joined = packages.join(" ");
        log_info!("[Packages] Installing with {}: {}", self, joined);
        run_checked(runner, &self.install_invocation(packages)).map_err(|output| {
            InstallerError::PackageInstall {
                manager: self.binary().to_string(),
                packages: joined.clone(),
                output,
            }
        })?;
        log_info!("[Packages] Packages installed successfully");
        Ok(())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Detects the manager and installs `packages` with it.
pub fn install_packages(runner: &dyn CommandRunner, packages: &[String]) -> Result<PackageManager> {
    let manager = PackageManager::detect(runner)?;
    manager.install(runner, packages)?;
    Ok(manager)
}
