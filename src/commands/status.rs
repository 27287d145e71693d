// The `status` command: read-only report on an existing installation.

use anyhow::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::error::InstallerError;
use crate::libs::paths::{AccountPaths, fallback_homes, home_from_passwd_entry};
use crate::libs::utilities::process::{CommandRunner, Invocation, SystemCommandRunner, run_checked};
use crate::{log_info, log_warn};

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCheck {
    pub label: &'static str,
    pub path: PathBuf,
    pub present: bool,
    /// Missing optional items only produce a warning.
    pub required: bool,
}

impl StatusCheck {
    fn mark(&self) -> colored::ColoredString {
        match (self.present, self.required) {
            (true, _) => "✓".green(),
            (false, true) => "✗".red(),
            (false, false) => "⚠".yellow(),
        }
    }
}

/// Finds the account home: the explicit override, then the account database,
/// then the first existing conventional location.
pub fn resolve_home(runner: &dyn CommandRunner, user: &str, explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    if let Ok(entry) = run_checked(runner, &Invocation::new("getent").arg("passwd").arg(user)) {
        if let Some(home) = home_from_passwd_entry(&entry) {
            return Some(home);
        }
    }
    fallback_homes(user).into_iter().find(|dir| runner.path_exists(dir))
}

pub fn collect(runner: &dyn CommandRunner, home: &Path) -> Vec<StatusCheck> {
    let paths = AccountPaths::new(home);
    let entries = [
        ("Home directory", paths.home().to_path_buf(), true),
        ("Python virtual environment", paths.venv_dir(), true),
        ("Environment activate script", paths.activate_script(), true),
        ("Ansible", paths.ansible(), true),
        ("Ansible Galaxy", paths.ansible_galaxy(), true),
        ("Collections directory", paths.collections_dir(), true),
        ("BlueBanquise infrastructure collection", paths.infrastructure_collection(), true),
        ("Core variables", paths.core_vars_file(), false),
    ];
    entries
        .into_iter()
        .map(|(label, path, required)| StatusCheck {
            present: runner.path_exists(&path),
            label,
            path,
            required,
        })
        .collect()
}

pub fn run(user: String, home: Option<PathBuf>) -> Result<()> {
    log_info!("[Status] Checking BlueBanquise installation for '{}'", user);
    let runner = SystemCommandRunner;

    let home = resolve_home(&runner, &user, home)
        .ok_or_else(|| InstallerError::Status(format!("{user} user home directory not found")))?;
    println!("User {} home directory: {}", user.bold(), home.display());

    let checks = collect(&runner, &home);
    for check in &checks {
        println!("{} {}: {}", check.mark(), check.label, check.path.display());
        if !check.present && !check.required {
            log_warn!("[Status] {} not found at {}", check.label, check.path.display());
        }
    }

    let failed: Vec<&str> = checks
        .iter()
        .filter(|c| c.required && !c.present)
        .map(|c| c.label)
        .collect();
    if !failed.is_empty() {
        return Err(InstallerError::Status(format!("missing: {}", failed.join(", "))).into());
    }

    println!();
    println!("{} BlueBanquise installation is ready!", "✓".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::process::testing::{RecordingRunner, fail, ok};
    use std::fs;

    #[test]
    fn explicit_home_wins() {
        let runner = RecordingRunner::succeeding();
        let home = resolve_home(&runner, "svc", Some(PathBuf::from("/srv/svc")));
        assert_eq!(home, Some(PathBuf::from("/srv/svc")));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn account_database_is_consulted_next() {
        let runner = RecordingRunner::with_responder(|_| ok("svc:x:377:377::/var/lib/svc:/bin/bash\n"));
        assert_eq!(resolve_home(&runner, "svc", None), Some(PathBuf::from("/var/lib/svc")));
    }

    #[test]
    fn conventional_locations_are_the_fallback() {
        let runner = RecordingRunner::with_responder(|_| fail(2, "")).with_paths(&["/opt/svc"]);
        assert_eq!(resolve_home(&runner, "svc", None), Some(PathBuf::from("/opt/svc")));
    }

    #[test]
    fn core_variables_are_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        fs::create_dir_all(paths.venv_bin()).unwrap();
        for file in [paths.activate_script(), paths.ansible(), paths.ansible_galaxy()] {
            fs::write(file, "").unwrap();
        }
        fs::create_dir_all(paths.infrastructure_collection()).unwrap();

        let checks = collect(&RecordingRunner::succeeding(), tmp.path());
        let missing: Vec<_> = checks.iter().filter(|c| !c.present).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].label, "Core variables");
        assert!(!missing[0].required);
    }
}
