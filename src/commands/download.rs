// The `download` command: stage artifacts on a connected machine so that
// `offline` can install them elsewhere.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::installers::runtime_env::{download_requirements, select_interpreter};
use crate::installers::{collections, core_vars};
use crate::libs::utilities::platform::detect_os;
use crate::libs::utilities::process::{CommandRunner, SystemCommandRunner};
use crate::log_info;
use crate::schemas::config::{DownloadConfig, HostLayout};
use crate::schemas::platform_table::PlatformTable;

pub fn run(config: DownloadConfig) -> Result<()> {
    log_info!("[Download] Staging artifacts in {}", config.path.display());
    let layout = HostLayout::default();
    let table = PlatformTable::builtin();
    stage(&SystemCommandRunner, &config, &layout.os_release, &table, core_vars::CORE_VARS_URL)
}

/// Picks the interpreter for this host the same way an install would, so the
/// staged packages match the Python the offline environment is built from.
fn staging_interpreter(runner: &dyn CommandRunner, os_release: &Path, table: &PlatformTable) -> Result<PathBuf> {
    let identity = detect_os(os_release).context("Error detecting the operating system")?;
    table.require(&identity).context("Error downloading requirements")?;
    let interpreter = select_interpreter(runner, &identity).context("Error selecting a Python interpreter")?;
    Ok(interpreter)
}

/// Runs the requested downloads in a fixed order: requirements, collections,
/// core variables. `--tarball` implies collections.
pub fn stage(
    runner: &dyn CommandRunner,
    config: &DownloadConfig,
    os_release: &Path,
    table: &PlatformTable,
    core_vars_url: &str,
) -> Result<()> {
    if config.requirements {
        let interpreter = staging_interpreter(runner, os_release, table)?;
        download_requirements(runner, &interpreter, &config.path).context("Error downloading requirements")?;
        println!("Python requirements downloaded to: {}", config.path.display());
        println!(
            "  use with: bluebanquise-installer offline --collections-path <collections-path> --requirements-path {}",
            config.path.display()
        );
    }

    if config.collections || config.tarball {
        let destination = config.collections_destination();
        collections::download_collections(runner, &config.path, &destination)
            .context("Error downloading collections")?;
        println!("Collections downloaded to: {}", destination.display());
        let flag = if config.tarball { "--tarball-path" } else { "--collections-path" };
        println!("  use with: bluebanquise-installer offline {flag} {}", destination.display());
    }

    if config.core_vars {
        let file = core_vars::download_to(core_vars_url, &config.path).context("Error downloading core variables")?;
        println!("Core variables downloaded to: {}", file.display());
        println!("  use with: bluebanquise-installer offline ... --core-vars-path {}", file.display());
    }

    log_info!("[Download] Staging complete in {}", config.path.display());
    Ok(())
}
