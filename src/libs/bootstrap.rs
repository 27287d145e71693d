// This module orchestrates a complete BlueBanquise installation on the host.
// It owns the order of the stages and nothing else: every stage lives in its
// own installer module and is handed the configuration built at the command
// line boundary.
//
// Stage order:
// - Detect the OS identity and look it up in the platform table.
// - Install the OS packages, then run the platform post-install hook.
// - Provision the service account.
// - Build and configure the runtime environment (unless skipped).
// - Install the collections and the core variables.
// - Hand the home directory over to the account.
//
// The first failing stage aborts the run. Stages already applied are left in
// place; re-running the installer picks up where it stopped because every
// stage is a no-op when its result is already present.

use crate::error::{InstallerError, Result};
use crate::installers::runtime_env::{self, PackageSource};
use crate::installers::{account, collections, core_vars, package_manager, post_hooks, shellrc, ssh};
use crate::libs::paths::AccountPaths;
use crate::libs::utilities::platform::{OsIdentity, detect_os};
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::schemas::config::{HostLayout, InstallConfig, InstallSource, OfflineSources};
use crate::schemas::platform_table::PlatformTable;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::fs;

/// Everything a run needs, borrowed from the command layer.
pub struct Bootstrap<'a> {
    pub runner: &'a dyn CommandRunner,
    pub layout: &'a HostLayout,
    pub table: &'a PlatformTable,
    pub config: &'a InstallConfig,
    /// Where online runs fetch `bb_core.yml` from.
    pub core_vars_url: &'a str,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        layout: &'a HostLayout,
        table: &'a PlatformTable,
        config: &'a InstallConfig,
    ) -> Self {
        Bootstrap {
            runner,
            layout,
            table,
            config,
            core_vars_url: core_vars::CORE_VARS_URL,
        }
    }

    fn paths(&self) -> AccountPaths {
        AccountPaths::new(&self.config.home)
    }

    /// Runs every stage in order.
    ///
    /// # Returns
    /// * The detected OS identity, for the completion report.
    pub fn run(&self) -> Result<OsIdentity> {
        match serde_json::to_string_pretty(self.config) {
            Ok(pretty) => log_debug!("[Bootstrap] Installation configuration:\n{}", pretty),
            Err(e) => log_warn!("[Bootstrap] Failed to pretty-print configuration for debug log: {}", e),
        }

        let identity = self.install_platform_packages()?;

        account::provision_account(self.runner, self.layout, &self.config.user, &self.config.home)?;

        if self.config.skip_environment {
            log_info!("[Bootstrap] Skipping environment configuration");
        } else {
            self.configure_environment(&identity)?;
        }

        self.install_collections(&identity)?;
        self.install_core_variables()?;
        self.hand_over_home()?;

        log_info!("[Bootstrap] {}", "Installation completed successfully".green());
        Ok(identity)
    }

    /// Detection, table lookup, package installation and post-install hook.
    pub fn install_platform_packages(&self) -> Result<OsIdentity> {
        let identity = detect_os(&self.layout.os_release)?;
        log_info!("[Bootstrap] Detected OS: {}", identity.to_string().bold());

        let requirements = self.table.require(&identity)?;
        package_manager::install_packages(self.runner, &requirements.packages)?;

        // Hooks may put in place the interpreter the next stages depend on.
        if let Some(hook) = requirements.post_install {
            post_hooks::run(hook, self.runner)?;
        }
        Ok(identity)
    }

    /// Builds the runtime environment and wires the account's shell to it.
    pub fn configure_environment(&self, identity: &OsIdentity) -> Result<()> {
        let paths = self.paths();
        log_info!("[Bootstrap] Configuring environment for '{}' in {}", self.config.user, paths.home().display());

        if identity.is("rhel", "7") {
            shellrc::export_rh_python38(&paths)?;
        }

        let interpreter = runtime_env::select_interpreter(self.runner, identity)?;
        runtime_env::create_environment(self.runner, &interpreter, &paths)?;

        match &self.config.source {
            InstallSource::Online => runtime_env::populate_environment(self.runner, &paths, PackageSource::Index)?,
            InstallSource::Offline(OfflineSources {
                requirements: Some(dir), ..
            }) => runtime_env::populate_environment(self.runner, &paths, PackageSource::LocalDir(dir))?,
            InstallSource::Offline(_) => {
                log_warn!("[Bootstrap] No requirements path given, Python packages not installed");
            }
        }

        shellrc::configure_startup_file(&paths)?;
        shellrc::preserve_python_path(self.layout)?;
        ssh::configure_ssh(self.runner, &paths)?;

        let product_dir = paths.product_dir();
        fs::create_dir_all(&product_dir)
            .map_err(|e| InstallerError::io("cannot create product directory", &product_dir, e))?;

        log_info!("[Bootstrap] Environment configured");
        Ok(())
    }

    pub fn install_collections(&self, identity: &OsIdentity) -> Result<()> {
        let paths = self.paths();
        let galaxy = runtime_env::ensure_front_end(self.runner, identity, &paths, self.config.is_offline())?;
        match &self.config.source {
            InstallSource::Online => collections::install_online(self.runner, &galaxy, &paths),
            InstallSource::Offline(sources) => {
                collections::install_from_path(self.runner, &galaxy, sources.collections.path(), &paths).map(|_| ())
            }
        }
    }

    pub fn install_core_variables(&self) -> Result<()> {
        let paths = self.paths();
        match &self.config.source {
            InstallSource::Online => {
                core_vars::install_online(self.core_vars_url, &paths)?;
            }
            InstallSource::Offline(OfflineSources {
                core_vars: Some(source), ..
            }) => {
                core_vars::install_from_path(source, &paths)?;
            }
            InstallSource::Offline(_) => {
                log_info!("[Bootstrap] No core variables path given, skipping core variables");
            }
        }
        Ok(())
    }

    /// Gives the account ownership of everything written under its home.
    pub fn hand_over_home(&self) -> Result<()> {
        let owner = format!("{0}:{0}", self.config.user);
        let chown = Invocation::new("chown")
            .arg("-R")
            .arg(&owner)
            .path_arg(&self.config.home);
        run_checked(self.runner, &chown).map_err(|reason| InstallerError::AccountProvision {
            account: self.config.user.clone(),
            step: "home ownership",
            reason,
        })?;
        log_debug!("[Bootstrap] {} now owned by {}", self.config.home.display(), owner);
        Ok(())
    }
}
