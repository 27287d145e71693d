// The `online` command: system checks, then the full bootstrap with every
// artifact fetched from the network.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::cmd_enums::AccountArgs;
use crate::libs::bootstrap::Bootstrap;
use crate::libs::prerequisites::{run_system_checks, system_checks};
use crate::libs::utilities::process::SystemCommandRunner;
use crate::log_info;
use crate::schemas::config::{HostLayout, InstallConfig, InstallSource};
use crate::schemas::platform_table::PlatformTable;

pub fn run(account: AccountArgs, skip_environment: bool) -> Result<()> {
    log_info!(
        "[Online] Starting BlueBanquise {} installation for '{}'",
        "online".bold(),
        account.user
    );

    let runner = SystemCommandRunner;
    println!("Checking system prerequisites...");
    run_system_checks(&runner, &system_checks(true)).context("System check failed")?;

    let config = InstallConfig {
        user: account.user,
        home: account.home,
        skip_environment,
        source: InstallSource::Online,
    };
    let layout = HostLayout::default();
    let table = PlatformTable::builtin();

    Bootstrap::new(&runner, &layout, &table, &config)
        .run()
        .context("Online installation failed")?;

    super::show_completion_message(&config.user, &config.home);
    Ok(())
}
