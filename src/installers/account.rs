// Service account provisioning.
//
// Ensures the dedicated group and user exist with the fixed UID/GID and that
// the account has its passwordless privilege grant. Existing group or user
// entries are kept as they are; their numeric ids are not compared.

use crate::error::{InstallerError, Result};
use crate::libs::utilities::file_operations::append_line_if_missing;
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::schemas::config::{ACCOUNT_GID, ACCOUNT_SHELL, ACCOUNT_UID, HostLayout};
use crate::{log_debug, log_info};
use std::fs;
use std::path::Path;

/// Passwordless grant line for `account`.
pub fn grant_rule(account: &str) -> String {
    format!("{account} ALL=(ALL:ALL) NOPASSWD:ALL")
}

/// Whether `getent <database> <name>` finds an entry.
fn entry_exists(runner: &dyn CommandRunner, database: &str, name: &str) -> bool {
    let invocation = Invocation::new("getent").arg(database).arg(name);
    matches!(runner.run(&invocation), Ok(out) if out.success)
}

fn provision_error<'a>(account: &'a str, step: &'static str) -> impl FnOnce(String) -> InstallerError + 'a {
    move |reason| InstallerError::AccountProvision {
        account: account.to_string(),
        step,
        reason,
    }
}

/// Creates the group, user and grant file for `account` as needed.
pub fn provision_account(runner: &dyn CommandRunner, layout: &HostLayout, account: &str, home: &Path) -> Result<()> {
    if account.trim().is_empty() {
        return Err(InstallerError::InvalidArgument("account name must not be empty".to_string()));
    }
    if home.as_os_str().is_empty() {
        return Err(InstallerError::InvalidArgument("home directory must not be empty".to_string()));
    }

    log_info!("[Account] Provisioning account '{}' with home {}", account, home.display());

    if entry_exists(runner, "group", account) {
        log_info!("[Account] Group '{}' already exists", account);
    } else {
        let groupadd = Invocation::new("groupadd")
            .arg("--gid")
            .arg(ACCOUNT_GID.to_string())
            .arg(account);
        run_checked(runner, &groupadd).map_err(provision_error(account, "group creation"))?;
        log_info!("[Account] Group '{}' created with gid {}", account, ACCOUNT_GID);
    }

    if entry_exists(runner, "passwd", account) {
        log_info!("[Account] User '{}' already exists", account);
    } else {
        let useradd = Invocation::new("useradd")
            .arg("--gid")
            .arg(ACCOUNT_GID.to_string())
            .arg("--uid")
            .arg(ACCOUNT_UID.to_string())
            .arg("--create-home")
            .arg("--home-dir")
            .path_arg(home)
            .args(["--shell", ACCOUNT_SHELL, "--system"])
            .arg(account);
        run_checked(runner, &useradd).map_err(provision_error(account, "user creation"))?;
        log_info!("[Account] User '{}' created with uid {}", account, ACCOUNT_UID);
    }

    grant_privileges(layout, account)
}

/// Ensures the grant file carries the passwordless rule. The file may be
/// shared with other privilege settings, so other lines are kept.
pub fn grant_privileges(layout: &HostLayout, account: &str) -> Result<()> {
    let grant_file = layout.account_sudoers_file(account);
    let to_error = |e: std::io::Error| InstallerError::AccountProvision {
        account: account.to_string(),
        step: "privilege grant",
        reason: format!("{}: {e}", grant_file.display()),
    };

    fs::create_dir_all(&layout.sudoers_dir).map_err(to_error)?;
    if append_line_if_missing(&grant_file, &grant_rule(account)).map_err(to_error)? {
        log_info!("[Account] Privilege grant written to {}", grant_file.display());
    } else {
        log_debug!("[Account] Privilege grant {} already up to date", grant_file.display());
    }
    Ok(())
}
