// Ansible collection artifacts.
//
// Installs collections into `<home>/.ansible/collections` with the
// environment's `ansible-galaxy`, either straight from their upstream sources
// or from archives staged on disk, and stages those archives for offline use.

use crate::error::{InstallerError, Result};
use crate::installers::runtime_env::DEFAULT_INTERPRETER;
use crate::libs::paths::AccountPaths;
use crate::libs::utilities::file_operations::files_with_suffix;
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::{log_debug, log_info, log_warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Upstream sources of the collections, in installation order.
pub const COLLECTION_SOURCES: &[&str] = &[
    "git+https://github.com/bluebanquise/bluebanquise.git#/collections/infrastructure,master",
    "community.general",
];

pub const COLLECTION_ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];

fn require_home(paths: &AccountPaths) -> Result<()> {
    if paths.home().as_os_str().is_empty() {
        return Err(InstallerError::InvalidArgument("home directory must not be empty".to_string()));
    }
    Ok(())
}

fn prepare_collections_dir(paths: &AccountPaths) -> Result<PathBuf> {
    require_home(paths)?;
    let dir = paths.collections_dir();
    fs::create_dir_all(&dir).map_err(|e| InstallerError::io("cannot create collections directory", &dir, e))?;
    Ok(dir)
}

fn galaxy_install(galaxy: &Path, source: &str, collections_dir: &Path) -> Invocation {
    Invocation::new(galaxy.to_string_lossy())
        .args(["collection", "install", source, "-p"])
        .path_arg(collections_dir)
}

fn install_artifact(runner: &dyn CommandRunner, galaxy: &Path, artifact: &Path, collections_dir: &Path) -> Result<()> {
    log_info!("[Collections] Installing collection from {}", artifact.display());
    let invocation = galaxy_install(galaxy, &artifact.to_string_lossy(), collections_dir);
    run_checked(runner, &invocation).map_err(|reason| InstallerError::ArtifactInstall {
        artifact: artifact.to_path_buf(),
        reason,
    })?;
    Ok(())
}

/// Installs a single archive, or every archive directly inside a directory.
/// Other files are ignored. The first failing archive stops the run; the
/// ones before it stay installed.
///
/// # Returns
/// * The number of archives installed.
pub fn install_from_path(runner: &dyn CommandRunner, galaxy: &Path, source: &Path, paths: &AccountPaths) -> Result<usize> {
    let collections_dir = prepare_collections_dir(paths)?;
    let metadata = fs::metadata(source).map_err(|e| InstallerError::io("cannot access", source, e))?;

    if !metadata.is_dir() {
        install_artifact(runner, galaxy, source, &collections_dir)?;
        return Ok(1);
    }

    log_info!("[Collections] Installing collection archives from {}", source.display());
    let artifacts = files_with_suffix(source, COLLECTION_ARCHIVE_SUFFIXES)
        .map_err(|e| InstallerError::io("cannot read directory", source, e))?;
    if artifacts.is_empty() {
        log_warn!("[Collections] No .tar.gz or .tgz archives in {}, nothing installed", source.display());
    }
    for artifact in &artifacts {
        install_artifact(runner, galaxy, artifact, &collections_dir)?;
    }
    log_info!("[Collections] {} collections installed into {}", artifacts.len(), collections_dir.display());
    Ok(artifacts.len())
}

/// Installs every upstream collection from the network.
pub fn install_online(runner: &dyn CommandRunner, galaxy: &Path, paths: &AccountPaths) -> Result<()> {
    let collections_dir = prepare_collections_dir(paths)?;
    for source in COLLECTION_SOURCES {
        log_info!("[Collections] Installing {}", source);
        run_checked(runner, &galaxy_install(galaxy, source, &collections_dir)).map_err(|reason| {
            InstallerError::ArtifactInstall {
                artifact: PathBuf::from(source),
                reason,
            }
        })?;
    }
    log_info!("[Collections] Collections installed into {}", collections_dir.display());
    Ok(())
}

/// Downloads the upstream collections as archives into `dest`.
///
/// `ansible-galaxy` comes from a throwaway environment created inside
/// `staging_root`; it is removed afterwards whatever the outcome.
pub fn download_collections(runner: &dyn CommandRunner, staging_root: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(staging_root)
        .map_err(|e| InstallerError::io("cannot create download directory", staging_root, e))?;
    let temp_env = tempfile::Builder::new()
        .prefix("temp_venv")
        .tempdir_in(staging_root)
        .map_err(|e| InstallerError::io("cannot create temporary environment", staging_root, e))?;

    let outcome = download_with_temp_env(runner, temp_env.path(), dest);

    let temp_path = temp_env.path().to_path_buf();
    if let Err(e) = temp_env.close() {
        log_warn!(
            "[Collections] Could not remove temporary environment {}: {}",
            temp_path.display(),
            e
        );
    }
    outcome
}

fn download_with_temp_env(runner: &dyn CommandRunner, env_dir: &Path, dest: &Path) -> Result<()> {
    let env_error = |reason: String| InstallerError::EnvironmentCreation {
        path: env_dir.to_path_buf(),
        reason,
    };

    log_info!("[Collections] Preparing temporary ansible-galaxy in {}", env_dir.display());
    run_checked(
        runner,
        &Invocation::new(DEFAULT_INTERPRETER).args(["-m", "venv"]).path_arg(env_dir),
    )
    .map_err(env_error)?;
    run_checked(
        runner,
        &Invocation::new(env_dir.join("bin").join("pip").to_string_lossy()).args(["install", "ansible-core"]),
    )
    .map_err(env_error)?;

    let galaxy = env_dir.join("bin").join("ansible-galaxy");
    for source in COLLECTION_SOURCES {
        log_info!("[Collections] Downloading {}", source);
        let invocation = Invocation::new(galaxy.to_string_lossy())
            .args(["collection", "download", source, "-p"])
            .path_arg(dest);
        run_checked(runner, &invocation).map_err(|reason| InstallerError::Download {
            url: source.to_string(),
            reason,
        })?;
    }
    log_debug!("[Collections] Collections staged in {}", dest.display());
    log_info!("[Collections] Collections downloaded to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::process::testing::{RecordingRunner, fail, ok};

    fn galaxy(paths: &AccountPaths) -> PathBuf {
        paths.ansible_galaxy()
    }

    #[test]
    fn directory_install_picks_archives_only() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let staged = tmp.path().join("staged");
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("bluebanquise-infrastructure-3.0.0.tar.gz"), "").unwrap();
        fs::write(staged.join("community-general-9.0.0.tgz"), "").unwrap();
        fs::write(staged.join("README.md"), "").unwrap();

        let runner = RecordingRunner::succeeding();
        let installed = install_from_path(&runner, &galaxy(&paths), &staged, &paths).unwrap();

        assert_eq!(installed, 2);
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].args[2].ends_with("bluebanquise-infrastructure-3.0.0.tar.gz"));
        assert!(calls[1].args[2].ends_with("community-general-9.0.0.tgz"));
        assert_eq!(calls[0].args[4], paths.collections_dir().to_string_lossy());
        assert!(paths.collections_dir().is_dir());
    }

    #[test]
    fn directory_without_archives_installs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let staged = tmp.path().join("staged");
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("notes.txt"), "").unwrap();

        let runner = RecordingRunner::succeeding();
        assert_eq!(install_from_path(&runner, &galaxy(&paths), &staged, &paths).unwrap(), 0);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn single_archive_is_installed_directly() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let archive = tmp.path().join("bluebanquise-infrastructure-3.0.0.tar.gz");
        fs::write(&archive, "").unwrap();

        let runner = RecordingRunner::succeeding();
        assert_eq!(install_from_path(&runner, &galaxy(&paths), &archive, &paths).unwrap(), 1);
        assert_eq!(runner.calls.borrow()[0].args[2], archive.to_string_lossy());
    }

    #[test]
    fn first_failing_archive_aborts_and_is_named() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let staged = tmp.path().join("staged");
        fs::create_dir_all(&staged).unwrap();
        fs::write(staged.join("a.tar.gz"), "").unwrap();
        fs::write(staged.join("b.tar.gz"), "").unwrap();

        let runner = RecordingRunner::with_responder(|_| fail(1, "corrupt archive"));
        let err = install_from_path(&runner, &galaxy(&paths), &staged, &paths).unwrap_err();
        match err {
            InstallerError::ArtifactInstall { artifact, .. } => assert!(artifact.ends_with("a.tar.gz")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn online_install_uses_both_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        let runner = RecordingRunner::succeeding();
        install_online(&runner, &galaxy(&paths), &paths).unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[2], COLLECTION_SOURCES[0]);
        assert_eq!(calls[1].args[2], "community.general");
    }

    #[test]
    fn empty_home_is_rejected() {
        let paths = AccountPaths::new("");
        let runner = RecordingRunner::succeeding();
        let err = install_online(&runner, Path::new("ansible-galaxy"), &paths).unwrap_err();
        assert!(matches!(err, InstallerError::InvalidArgument(_)));
    }

    #[test]
    fn download_removes_the_temporary_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("collections");
        let runner = RecordingRunner::with_responder(|_| ok(""));
        download_collections(&runner, tmp.path(), &dest).unwrap();

        let rendered = runner.rendered();
        assert_eq!(rendered.len(), 4);
        assert!(rendered[0].starts_with("/usr/bin/python3 -m venv"));
        assert!(rendered[1].ends_with("install ansible-core"));
        assert!(rendered[2].contains("collection download git+https://"));
        assert!(rendered[3].contains("collection download community.general"));
        let leftovers: Vec<_> = fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
