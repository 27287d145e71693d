// Core variables: the `group_vars/all` files of the BlueBanquise inventory.
// They are placed verbatim; nothing here parses YAML.

use crate::error::{InstallerError, Result};
use crate::libs::paths::{AccountPaths, CORE_VARS_FILE_NAME};
use crate::libs::utilities::assets::{DOWNLOAD_TIMEOUT, download_file};
use crate::libs::utilities::file_operations::{copy_file, files_with_suffix};
use crate::log_info;
use std::fs;
use std::path::{Path, PathBuf};

pub const CORE_VARS_URL: &str =
    "https://raw.githubusercontent.com/bluebanquise/bluebanquise/refs/heads/master/resources/bb_core.yml";

pub const VARIABLE_FILE_SUFFIXES: &[&str] = &[".yml", ".yaml"];

/// Creates `group_vars/all` under the home, failing fast on an empty home.
fn prepare_destination(paths: &AccountPaths) -> Result<PathBuf> {
    if paths.home().as_os_str().is_empty() {
        return Err(InstallerError::InvalidArgument("home directory must not be empty".to_string()));
    }
    let dir = paths.group_vars_dir();
    fs::create_dir_all(&dir).map_err(|e| InstallerError::io("cannot create inventory directory", &dir, e))?;
    Ok(dir)
}

/// Fetches `bb_core.yml` from `url` into the inventory.
pub fn install_online(url: &str, paths: &AccountPaths) -> Result<PathBuf> {
    prepare_destination(paths)?;
    let dest = paths.core_vars_file();
    log_info!("[Core Vars] Downloading core variables from {}", url);
    download_file(url, &dest, DOWNLOAD_TIMEOUT).map_err(|e| InstallerError::CoreVariablesInstall {
        file: dest.clone(),
        reason: e.to_string(),
    })?;
    Ok(dest)
}

/// Copies a variables file (as `bb_core.yml`), or every `.yml`/`.yaml` file
/// directly inside a directory (under its own name), into the inventory.
/// Existing files of the same name are overwritten.
///
/// # Returns
/// * The installed destination paths.
pub fn install_from_path(source: &Path, paths: &AccountPaths) -> Result<Vec<PathBuf>> {
    let dest_dir = prepare_destination(paths)?;
    let metadata = fs::metadata(source).map_err(|e| InstallerError::io("cannot access", source, e))?;

    let pairs: Vec<(PathBuf, PathBuf)> = if metadata.is_dir() {
        files_with_suffix(source, VARIABLE_FILE_SUFFIXES)
            .map_err(|e| InstallerError::io("cannot read directory", source, e))?
            .into_iter()
            .filter_map(|file| {
                let name = file.file_name()?.to_os_string();
                Some((file, dest_dir.join(name)))
            })
            .collect()
    } else {
        vec![(source.to_path_buf(), dest_dir.join(CORE_VARS_FILE_NAME))]
    };

    let mut installed = Vec::with_capacity(pairs.len());
    for (from, to) in pairs {
        log_info!("[Core Vars] Installing {} -> {}", from.display(), to.display());
        copy_file(&from, &to).map_err(|e| InstallerError::CoreVariablesInstall {
            file: from.clone(),
            reason: e.to_string(),
        })?;
        installed.push(to);
    }
    Ok(installed)
}

/// Stages `bb_core.yml` into `dir` for a later offline run.
pub fn download_to(url: &str, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| InstallerError::io("cannot create download directory", dir, e))?;
    let dest = dir.join(CORE_VARS_FILE_NAME);
    download_file(url, &dest, DOWNLOAD_TIMEOUT)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_lands_as_bb_core() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let src = tmp.path().join("my-vars.yml");
        fs::write(&src, "bb_domain_name: cluster.local\n").unwrap();

        let installed = install_from_path(&src, &paths).unwrap();
        assert_eq!(installed, vec![paths.core_vars_file()]);
        assert_eq!(
            fs::read_to_string(paths.core_vars_file()).unwrap(),
            "bb_domain_name: cluster.local\n"
        );
    }

    #[test]
    fn directory_copies_variable_files_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let src = tmp.path().join("vars");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("bb_core.yml"), "a: 1\n").unwrap();
        fs::write(src.join("network.yaml"), "b: 2\n").unwrap();
        fs::write(src.join("notes.txt"), "skip").unwrap();

        let installed = install_from_path(&src, &paths).unwrap();
        assert_eq!(installed.len(), 2);
        assert!(paths.group_vars_dir().join("network.yaml").is_file());
        assert!(!paths.group_vars_dir().join("notes.txt").exists());
    }

    #[test]
    fn existing_files_are_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        fs::create_dir_all(paths.group_vars_dir()).unwrap();
        fs::write(paths.core_vars_file(), "old").unwrap();
        let src = tmp.path().join("bb_core.yml");
        fs::write(&src, "new").unwrap();

        install_from_path(&src, &paths).unwrap();
        assert_eq!(fs::read_to_string(paths.core_vars_file()).unwrap(), "new");
    }

    #[test]
    fn empty_home_is_rejected() {
        let err = install_from_path(Path::new("/nonexistent"), &AccountPaths::new("")).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument(_)));
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        assert!(install_from_path(&tmp.path().join("missing.yml"), &paths).is_err());
    }
}
