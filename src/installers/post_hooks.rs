// Post-install hooks.
//
// Resolves the symbolic hook identifiers of the platform table to the actions
// they stand for. Hooks run after OS packages are installed and before the
// account and environment are provisioned, because they put in place the
// interpreter those later stages use.

use crate::error::{InstallerError, Result};
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::schemas::platform_table::HookId;
use crate::{log_debug, log_info, log_warn};
use std::path::Path;

pub const PYTHON_SOURCE_VERSION: &str = "3.11.4";

type HookFn = fn(&dyn CommandRunner) -> Result<()>;

/// The registration step: identifier to implementation.
pub fn resolve(hook: HookId) -> HookFn {
    match hook {
        HookId::BuildPython311FromSource => build_python311_from_source,
        HookId::LinkPython311AsDefault => link_python311_as_default,
    }
}

pub fn run(hook: HookId, runner: &dyn CommandRunner) -> Result<()> {
    log_info!("[Post Hook] Running post-installation hook '{}'", hook);
    resolve(hook)(runner)?;
    log_info!("[Post Hook] '{}' completed", hook);
    Ok(())
}

/// `update-alternatives` registrations making `python3`, `python`, `pip3` and
/// `pip` point at the 3.11 binaries found in `bin_dir`.
pub fn alternatives_for(bin_dir: &str) -> Vec<Invocation> {
    [
        ("/usr/bin/python3", "python3", "python3.11"),
        ("/usr/bin/python", "python", "python3.11"),
        ("/usr/bin/pip3", "pip3", "pip3.11"),
        ("/usr/bin/pip", "pip", "pip3.11"),
    ]
    .into_iter()
    .map(|(link, name, target)| {
        Invocation::new("update-alternatives")
            .args(["--install", link, name])
            .arg(format!("{bin_dir}/{target}"))
            .arg("3")
    })
    .collect()
}

fn run_steps(hook: HookId, runner: &dyn CommandRunner, steps: &[Invocation]) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        log_debug!("[Post Hook] Step {}/{}: {}", i + 1, steps.len(), step.display());
        run_checked(runner, step).map_err(|reason| InstallerError::PostInstallHook {
            hook: hook.to_string(),
            reason,
        })?;
    }
    Ok(())
}

/// Source build steps, run from `build_root`.
pub fn source_build_steps(build_root: &Path) -> Vec<Invocation> {
    let tarball = format!("Python-{PYTHON_SOURCE_VERSION}.tgz");
    let url = format!("https://www.python.org/ftp/python/{PYTHON_SOURCE_VERSION}/{tarball}");
    let source_dir = build_root.join(format!("Python-{PYTHON_SOURCE_VERSION}"));

    let mut steps = vec![
        Invocation::new("wget").arg("-q").arg(&url).current_dir(build_root),
        Invocation::new("tar").arg("-xf").arg(&tarball).current_dir(build_root),
        Invocation::new(source_dir.join("configure").to_string_lossy())
            .args(["--enable-optimizations", "--with-ensurepip=install"])
            .current_dir(&source_dir),
        Invocation::new("make").arg("-j").current_dir(&source_dir),
        Invocation::new("make").arg("altinstall").current_dir(&source_dir),
    ];
    steps.extend(alternatives_for("/usr/local/bin"));
    steps
}

fn build_python311_from_source(runner: &dyn CommandRunner) -> Result<()> {
    let hook = HookId::BuildPython311FromSource;
    log_info!("[Post Hook] Building Python {} from source", PYTHON_SOURCE_VERSION);

    let build_dir = tempfile::Builder::new()
        .prefix("python-build-")
        .tempdir()
        .map_err(|e| InstallerError::PostInstallHook {
            hook: hook.to_string(),
            reason: format!("cannot create build directory: {e}"),
        })?;

    let outcome = run_steps(hook, runner, &source_build_steps(build_dir.path()));

    let build_path = build_dir.path().to_path_buf();
    if let Err(e) = build_dir.close() {
        log_warn!(
            "[Post Hook] Could not remove build directory {}: {}",
            build_path.display(),
            e
        );
    }
    outcome
}

fn link_python311_as_default(runner: &dyn CommandRunner) -> Result<()> {
    log_info!("[Post Hook] Linking python3.11 as default interpreter");
    run_steps(
        HookId::LinkPython311AsDefault,
        runner,
        &alternatives_for("/usr/bin"),
    )
}
