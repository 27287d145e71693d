// The `offline` command: validate the staged sources first, then run the
// bootstrap without touching the network.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::cmd_enums::AccountArgs;
use crate::libs::bootstrap::Bootstrap;
use crate::libs::prerequisites::{check_offline_sources, run_system_checks, system_checks};
use crate::libs::utilities::process::SystemCommandRunner;
use crate::log_info;
use crate::schemas::config::{CollectionSource, HostLayout, InstallConfig, InstallSource, OfflineSources};
use crate::schemas::platform_table::PlatformTable;

/// Staged paths as given on the command line.
pub struct OfflineArgs {
    pub collections_path: Option<PathBuf>,
    pub tarball_path: Option<PathBuf>,
    pub requirements_path: Option<PathBuf>,
    pub core_vars_path: Option<PathBuf>,
}

/// Turns the flags into sources. The argument parser already enforces
/// exactly one collection source; this only repeats it for direct callers.
pub fn sources_from_args(args: OfflineArgs) -> Result<OfflineSources> {
    let collections = match (args.collections_path, args.tarball_path) {
        (Some(dir), None) => CollectionSource::Directory(dir),
        (None, Some(tarball)) => CollectionSource::Tarball(tarball),
        (Some(_), Some(_)) => anyhow::bail!("--collections-path and --tarball-path are mutually exclusive"),
        (None, None) => anyhow::bail!("one of --collections-path or --tarball-path is required"),
    };
    Ok(OfflineSources {
        collections,
        requirements: args.requirements_path,
        core_vars: args.core_vars_path,
    })
}

pub fn run(account: AccountArgs, skip_environment: bool, args: OfflineArgs) -> Result<()> {
    log_info!(
        "[Offline] Starting BlueBanquise {} installation for '{}'",
        "offline".bold(),
        account.user
    );

    let sources = sources_from_args(args)?;
    check_offline_sources(&sources).context("Offline prerequisites not met")?;

    let runner = SystemCommandRunner;
    println!("Checking system prerequisites...");
    run_system_checks(&runner, &system_checks(false)).context("System check failed")?;

    let config = InstallConfig {
        user: account.user,
        home: account.home,
        skip_environment,
        source: InstallSource::Offline(sources),
    };
    let layout = HostLayout::default();
    let table = PlatformTable::builtin();

    Bootstrap::new(&runner, &layout, &table, &config)
        .run()
        .context("Offline installation failed")?;

    super::show_completion_message(&config.user, &config.home);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(collections: Option<&str>, tarball: Option<&str>) -> OfflineArgs {
        OfflineArgs {
            collections_path: collections.map(PathBuf::from),
            tarball_path: tarball.map(PathBuf::from),
            requirements_path: None,
            core_vars_path: None,
        }
    }

    #[test]
    fn one_collection_source_only() {
        assert!(sources_from_args(args(Some("/c"), Some("/t"))).is_err());
        assert!(sources_from_args(args(None, None)).is_err());
        let sources = sources_from_args(args(None, Some("/t.tgz"))).unwrap();
        assert_eq!(sources.collections, CollectionSource::Tarball(PathBuf::from("/t.tgz")));
    }
}
