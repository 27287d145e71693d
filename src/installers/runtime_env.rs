// Python runtime environment.
//
// Builds the isolated interpreter environment (`<home>/ansible_venv`) the
// collections run from, and fills it with the runtime packages, either from
// the package index or from a pre-staged wheel directory. Also stages those
// packages for a later offline run.

use crate::error::{InstallerError, Result};
use crate::libs::paths::{AccountPaths, MANIFEST_FILE_NAME};
use crate::libs::utilities::file_operations::files_with_suffix;
use crate::libs::utilities::platform::OsIdentity;
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::{log_debug, log_info};
use std::fs;
use std::path::{Path, PathBuf};

/// Python packages every BlueBanquise environment needs.
pub const RUNTIME_PACKAGES: &[&str] = &[
    "ansible",
    "ansible-core",
    "netaddr",
    "clustershell",
    "jmespath",
    "jinja2",
    "pymysql",
];

/// Suffixes of installable runtime artifacts.
pub const RUNTIME_ARTIFACT_SUFFIXES: &[&str] = &[".whl", ".tar.gz", ".tgz"];

pub const DEFAULT_INTERPRETER: &str = "/usr/bin/python3";

/// Where runtime packages are resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource<'a> {
    /// The network package index.
    Index,
    /// Only the given directory; it must hold `requirements.txt`.
    LocalDir(&'a Path),
}

/// Interpreter binaries to try for `identity`, most preferred first.
pub fn interpreter_candidates(identity: &OsIdentity) -> Vec<&'static str> {
    match (identity.family.as_str(), identity.version.as_str()) {
        ("rhel", "7") => vec!["/opt/rh/rh-python38/root/usr/bin/python3"],
        ("rhel", "8") => vec!["/usr/bin/python3.9"],
        ("rhel", "9") => vec![
            "/usr/bin/python3.12",
            "/usr/bin/python3.11",
            "/usr/bin/python3.10",
            "/usr/bin/python3.9",
            DEFAULT_INTERPRETER,
        ],
        ("opensuse-leap", _) => vec!["/usr/bin/python3.11"],
        _ => vec![DEFAULT_INTERPRETER],
    }
}

/// Picks the interpreter the environment is created from. Must run before
/// creation: the environment inherits whichever binary creates it.
pub fn select_interpreter(runner: &dyn CommandRunner, identity: &OsIdentity) -> Result<PathBuf> {
    let candidates = interpreter_candidates(identity);
    let chosen = candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| runner.path_exists(p))
        .ok_or_else(|| InstallerError::EnvironmentCreation {
            path: PathBuf::from(candidates.join(", ")),
            reason: format!("no Python interpreter found for {identity}"),
        })?;
    log_info!("[Environment] Using Python interpreter {} for {}", chosen.display(), identity);
    Ok(chosen)
}

/// Creates the environment at `paths.venv_dir()` unless one is already there.
///
/// # Returns
/// * `Ok(true)` if a new environment was created, `Ok(false)` if an existing
///   one was kept.
pub fn create_environment(runner: &dyn CommandRunner, interpreter: &Path, paths: &AccountPaths) -> Result<bool> {
    let venv_dir = paths.venv_dir();
    if runner.path_exists(&paths.venv_python()) {
        log_info!("[Environment] Reusing existing environment at {}", venv_dir.display());
        return Ok(false);
    }

    log_info!("[Environment] Creating Python virtual environment at {}", venv_dir.display());
    let invocation = Invocation::new(interpreter.to_string_lossy())
        .args(["-m", "venv"])
        .path_arg(&venv_dir);
    run_checked(runner, &invocation).map_err(|reason| InstallerError::EnvironmentCreation {
        path: venv_dir.clone(),
        reason,
    })?;
    Ok(true)
}

/// Writes the newline-joined package manifest into `dir`.
pub fn write_manifest(dir: &Path, packages: &[&str]) -> Result<PathBuf> {
    let manifest = dir.join(MANIFEST_FILE_NAME);
    fs::write(&manifest, packages.join("\n"))
        .map_err(|e| InstallerError::io("cannot write requirements manifest", &manifest, e))?;
    log_debug!("[Environment] Wrote manifest {} ({} packages)", manifest.display(), packages.len());
    Ok(manifest)
}

/// Installs the runtime packages into the environment.
pub fn populate_environment(runner: &dyn CommandRunner, paths: &AccountPaths, source: PackageSource<'_>) -> Result<()> {
    let venv_dir = paths.venv_dir();
    let python = paths.venv_python();

    let invocation = match source {
        PackageSource::Index => {
            let manifest = write_manifest(&venv_dir, RUNTIME_PACKAGES)?;
            log_info!("[Environment] Installing Python packages: {}", RUNTIME_PACKAGES.join(" "));
            // pip itself is upgraded in a separate run, before the manifest.
            run_checked(
                runner,
                &Invocation::new(python.to_string_lossy()).args(["-m", "pip", "install", "--upgrade", "pip"]),
            )
            .map_err(|reason| InstallerError::EnvironmentCreation {
                path: venv_dir.clone(),
                reason,
            })?;
            Invocation::new(python.to_string_lossy())
                .args(["-m", "pip", "install", "-r"])
                .path_arg(&manifest)
        }
        PackageSource::LocalDir(dir) => {
            let manifest = dir.join(MANIFEST_FILE_NAME);
            if !manifest.is_file() {
                return Err(InstallerError::PrerequisiteValidation {
                    path: manifest,
                    reason: "requirements manifest not found".to_string(),
                });
            }
            log_info!("[Environment] Installing Python packages from local directory {}", dir.display());
            Invocation::new(python.to_string_lossy())
                .args(["-m", "pip", "install", "--no-index", "--find-links"])
                .path_arg(dir)
                .arg("-r")
                .path_arg(&manifest)
        }
    };

    run_checked(runner, &invocation).map_err(|reason| InstallerError::EnvironmentCreation {
        path: venv_dir.clone(),
        reason,
    })?;

    // A zero exit alone does not prove `ansible` landed in the environment.
    if !runner.path_exists(&paths.ansible()) {
        return Err(InstallerError::NoPackagesInstalled { path: venv_dir });
    }
    log_info!("[Environment] Python requirements installed into {}", venv_dir.display());
    Ok(())
}

/// Makes sure `ansible-galaxy` exists in the environment before collections
/// are installed. Online, a missing front-end triggers a full environment
/// build; offline there is no network to fall back on.
pub fn ensure_front_end(
    runner: &dyn CommandRunner,
    identity: &OsIdentity,
    paths: &AccountPaths,
    offline: bool,
) -> Result<PathBuf> {
    let galaxy = paths.ansible_galaxy();
    if runner.path_exists(&galaxy) {
        return Ok(galaxy);
    }
    if offline {
        return Err(InstallerError::EnvironmentCreation {
            path: paths.venv_dir(),
            reason: format!(
                "{} not found; configure the environment with --requirements-path",
                galaxy.display()
            ),
        });
    }

    log_info!("[Environment] ansible-galaxy not found, building the environment first");
    let interpreter = select_interpreter(runner, identity)?;
    create_environment(runner, &interpreter, paths)?;
    populate_environment(runner, paths, PackageSource::Index)?;

    if !runner.path_exists(&galaxy) {
        return Err(InstallerError::EnvironmentCreation {
            path: paths.venv_dir(),
            reason: format!("{} still missing after environment setup", galaxy.display()),
        });
    }
    Ok(galaxy)
}

/// Downloads (without installing) the runtime packages into `dest`, next to
/// their manifest, for a later offline run.
///
/// The downloader's exit status alone is not trusted: at least one artifact
/// must have landed in `dest`.
pub fn download_requirements(runner: &dyn CommandRunner, interpreter: &Path, dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).map_err(|e| InstallerError::io("cannot create download directory", dest, e))?;
    let manifest = write_manifest(dest, RUNTIME_PACKAGES)?;

    let invocation = Invocation::new(interpreter.to_string_lossy())
        .args(["-m", "pip", "download", "-r"])
        .path_arg(&manifest)
        .arg("-d")
        .path_arg(dest);
    run_checked(runner, &invocation).map_err(|reason| InstallerError::EnvironmentCreation {
        path: dest.to_path_buf(),
        reason,
    })?;

    let artifacts = count_runtime_artifacts(dest)?;
    if artifacts == 0 {
        return Err(InstallerError::NoPackagesInstalled {
            path: dest.to_path_buf(),
        });
    }
    log_info!("[Environment] {} Python packages downloaded to {}", artifacts, dest.display());
    Ok(artifacts)
}

/// Number of wheels/sdists directly inside `dir`.
pub fn count_runtime_artifacts(dir: &Path) -> Result<usize> {
    let found = files_with_suffix(dir, RUNTIME_ARTIFACT_SUFFIXES)
        .map_err(|e| InstallerError::io("cannot read directory", dir, e))?;
    for artifact in &found {
        log_debug!("[Environment] Found package {}", artifact.display());
    }
    Ok(found.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::utilities::process::testing::{RecordingRunner, fail, ok};

    #[test]
    fn interpreter_table() {
        assert_eq!(
            interpreter_candidates(&OsIdentity::new("rhel", "7")),
            vec!["/opt/rh/rh-python38/root/usr/bin/python3"]
        );
        assert_eq!(interpreter_candidates(&OsIdentity::new("rhel", "8")), vec!["/usr/bin/python3.9"]);
        assert_eq!(
            interpreter_candidates(&OsIdentity::new("opensuse-leap", "15.5")),
            vec!["/usr/bin/python3.11"]
        );
        assert_eq!(
            interpreter_candidates(&OsIdentity::new("ubuntu", "22.04")),
            vec![DEFAULT_INTERPRETER]
        );
    }

    #[test]
    fn rhel9_prefers_newest_present_interpreter() {
        let runner = RecordingRunner::succeeding().with_paths(&["/usr/bin/python3.11", "/usr/bin/python3"]);
        let chosen = select_interpreter(&runner, &OsIdentity::new("rhel", "9")).unwrap();
        assert_eq!(chosen, PathBuf::from("/usr/bin/python3.11"));
    }

    #[test]
    fn missing_interpreter_fails_before_creation() {
        let runner = RecordingRunner::succeeding();
        let err = select_interpreter(&runner, &OsIdentity::new("rhel", "7")).unwrap_err();
        assert!(matches!(err, InstallerError::EnvironmentCreation { .. }));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn environment_is_created_with_the_selected_interpreter() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        let runner = RecordingRunner::succeeding();
        assert!(create_environment(&runner, Path::new("/usr/bin/python3.9"), &paths).unwrap());
        assert_eq!(
            runner.rendered(),
            vec![format!("/usr/bin/python3.9 -m venv {}", paths.venv_dir().display())]
        );
    }

    #[test]
    fn existing_environment_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        fs::create_dir_all(paths.venv_bin()).unwrap();
        fs::write(paths.venv_python(), "").unwrap();
        let runner = RecordingRunner::succeeding();
        assert!(!create_environment(&runner, Path::new("/usr/bin/python3"), &paths).unwrap());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn creation_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        let runner = RecordingRunner::with_responder(|_| fail(1, "ensurepip is not available"));
        let err = create_environment(&runner, Path::new("/usr/bin/python3"), &paths).unwrap_err();
        assert!(err.to_string().contains("ensurepip"));
    }

    #[test]
    fn online_population_uses_a_manifest_in_the_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        fs::create_dir_all(paths.venv_bin()).unwrap();
        fs::write(paths.ansible(), "").unwrap();
        let runner = RecordingRunner::succeeding();
        populate_environment(&runner, &paths, PackageSource::Index).unwrap();

        let manifest = paths.venv_dir().join(MANIFEST_FILE_NAME);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), RUNTIME_PACKAGES.join("\n"));
        let rendered = runner.rendered();
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].ends_with("-m pip install --upgrade pip"));
        assert!(rendered[1].ends_with(&format!("-m pip install -r {}", manifest.display())));
    }

    #[test]
    fn offline_population_never_reaches_the_index() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let wheels = tmp.path().join("wheels");
        fs::create_dir_all(&wheels).unwrap();
        fs::write(wheels.join(MANIFEST_FILE_NAME), "ansible\n").unwrap();

        let runner = RecordingRunner::succeeding();
        let installed = paths.ansible().to_string_lossy().into_owned();
        let runner = runner.with_paths(&[installed.as_str()]);
        populate_environment(&runner, &paths, PackageSource::LocalDir(&wheels)).unwrap();
        let call = &runner.calls.borrow()[0];
        assert!(call.args.contains(&"--no-index".to_string()));
        assert!(call.args.contains(&wheels.to_string_lossy().into_owned()));
    }

    #[test]
    fn offline_population_requires_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path().join("home"));
        let runner = RecordingRunner::succeeding();
        let err = populate_environment(&runner, &paths, PackageSource::LocalDir(tmp.path())).unwrap_err();
        assert!(matches!(err, InstallerError::PrerequisiteValidation { .. }));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn silent_pip_success_without_packages_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        fs::create_dir_all(paths.venv_dir()).unwrap();
        let runner = RecordingRunner::succeeding();
        let err = populate_environment(&runner, &paths, PackageSource::Index).unwrap_err();
        assert!(matches!(err, InstallerError::NoPackagesInstalled { .. }));
    }

    #[test]
    fn download_without_artifacts_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::succeeding();
        let err = download_requirements(&runner, Path::new("/usr/bin/python3"), tmp.path()).unwrap_err();
        assert!(matches!(err, InstallerError::NoPackagesInstalled { .. }));
    }

    #[test]
    fn download_counts_landed_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().to_path_buf();
        let landing = dest.clone();
        let runner = RecordingRunner::with_responder(move |_| {
            fs::write(landing.join("ansible-9.0.0-py3-none-any.whl"), "").unwrap();
            fs::write(landing.join("netaddr-1.2.1.tar.gz"), "").unwrap();
            ok("Saved")
        });
        assert_eq!(download_requirements(&runner, Path::new("/usr/bin/python3"), &dest).unwrap(), 2);
    }

    #[test]
    fn offline_front_end_is_not_rebuilt() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AccountPaths::new(tmp.path());
        let runner = RecordingRunner::succeeding();
        let err = ensure_front_end(&runner, &OsIdentity::new("ubuntu", "22.04"), &paths, true).unwrap_err();
        assert!(err.to_string().contains("--requirements-path"));
        assert!(runner.calls.borrow().is_empty());
    }
}
