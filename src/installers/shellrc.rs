// Shell startup and privilege configuration files.
//
// Lines are only ever appended, and only when an identical (trimmed) line is
// not already present, so every function here can be re-run freely.

use crate::error::{InstallerError, Result};
use crate::libs::paths::AccountPaths;
use crate::libs::utilities::file_operations::append_line_if_missing;
use crate::schemas::config::HostLayout;
use crate::{log_debug, log_info};
use std::fs;
use std::path::Path;

/// Keeps `PYTHONPATH` when the account escalates privileges.
pub const PRESERVED_VARIABLE_RULE: &str = "Defaults env_keep += \"PYTHONPATH\"";

pub const ANSIBLE_CONFIG_EXPORT: &str = "export ANSIBLE_CONFIG=$HOME/bluebanquise/ansible.cfg";

/// Software collection exports needed for the rh-python38 interpreter on RHEL 7.
pub const RH_PYTHON38_EXPORTS: &[&str] = &[
    "export LD_LIBRARY_PATH=/opt/rh/rh-python38/root/usr/lib64:$LD_LIBRARY_PATH",
    "export MANPATH=/opt/rh/rh-python38/root/usr/share/man:$MANPATH",
    "export PATH=/opt/rh/rh-python38/root/usr/local/bin:/opt/rh/rh-python38/root/usr/bin:$PATH",
    "export PKG_CONFIG_PATH=/opt/rh/rh-python38/root/usr/lib64/pkgconfig:$PKG_CONFIG_PATH",
    "export XDG_DATA_DIRS=/opt/rh/rh-python38/root/usr/share:$XDG_DATA_DIRS",
    "export X_SCLS=\"rh-python38 \"",
];

/// Appends every line in order, returning how many were actually written.
pub fn append_lines(file: &Path, lines: &[&str]) -> Result<usize> {
    let mut written = 0;
    for line in lines {
        let added = append_line_if_missing(file, line).map_err(|source| InstallerError::EnvironmentFile {
            path: file.to_path_buf(),
            source,
        })?;
        if added {
            written += 1;
        }
    }
    log_debug!("[Shell Config] {} of {} lines added to {}", written, lines.len(), file.display());
    Ok(written)
}

/// Lines the account's `.bashrc` must carry.
pub fn startup_lines(paths: &AccountPaths) -> Vec<String> {
    vec![
        format!("source {}", paths.activate_script().display()),
        ANSIBLE_CONFIG_EXPORT.to_string(),
    ]
}

/// Makes login shells activate the environment and find the product config.
pub fn configure_startup_file(paths: &AccountPaths) -> Result<()> {
    let bashrc = paths.bashrc();
    let lines = startup_lines(paths);
    let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
    if append_lines(&bashrc, &borrowed)? > 0 {
        log_info!("[Shell Config] Updated {}", bashrc.display());
    } else {
        log_info!("[Shell Config] {} already configured", bashrc.display());
    }
    Ok(())
}

/// Adds the variable-preservation rule to the shared privilege file.
pub fn preserve_python_path(layout: &HostLayout) -> Result<()> {
    let target = layout.shared_sudoers_file();
    fs::create_dir_all(&layout.sudoers_dir).map_err(|source| InstallerError::EnvironmentFile {
        path: layout.sudoers_dir.clone(),
        source,
    })?;
    if append_lines(&target, &[PRESERVED_VARIABLE_RULE])? > 0 {
        log_info!("[Shell Config] PYTHONPATH preserved across sudo in {}", target.display());
    }
    Ok(())
}

pub fn export_rh_python38(paths: &AccountPaths) -> Result<()> {
    log_info!("[Shell Config] Exporting rh-python38 environment in {}", paths.bashrc().display());
    append_lines(&paths.bashrc(), RH_PYTHON38_EXPORTS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_file_is_configured_once() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        configure_startup_file(&paths).unwrap();
        configure_startup_file(&paths).unwrap();

        let content = fs::read_to_string(paths.bashrc()).unwrap();
        let activate = format!("source {}/ansible_venv/bin/activate", tmp.path().display());
        assert_eq!(content, format!("{activate}\n{ANSIBLE_CONFIG_EXPORT}\n"));
    }

    #[test]
    fn existing_startup_content_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        fs::write(paths.bashrc(), format!("alias ll='ls -l'\n{ANSIBLE_CONFIG_EXPORT}\n")).unwrap();
        configure_startup_file(&paths).unwrap();

        let content = fs::read_to_string(paths.bashrc()).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert_eq!(content.matches(ANSIBLE_CONFIG_EXPORT).count(), 1);
        assert!(content.contains("/ansible_venv/bin/activate"));
    }

    #[test]
    fn python_path_rule_goes_to_shared_file() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = HostLayout {
            os_release: tmp.path().join("os-release"),
            sudoers_dir: tmp.path().join("sudoers.d"),
        };
        preserve_python_path(&layout).unwrap();
        preserve_python_path(&layout).unwrap();
        assert_eq!(
            fs::read_to_string(layout.shared_sudoers_file()).unwrap(),
            format!("{PRESERVED_VARIABLE_RULE}\n")
        );
    }

    #[test]
    fn rh_python38_exports_are_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        export_rh_python38(&paths).unwrap();
        export_rh_python38(&paths).unwrap();
        let content = fs::read_to_string(paths.bashrc()).unwrap();
        assert_eq!(content.lines().count(), RH_PYTHON38_EXPORTS.len());
    }
}
