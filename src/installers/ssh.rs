// SSH bootstrap for the service account: a key pair of its own and that key
// authorized for logins to itself, which is how the playbooks reach
// localhost.

use crate::error::{InstallerError, Result};
use crate::libs::paths::AccountPaths;
use crate::libs::utilities::process::{CommandRunner, Invocation, run_checked};
use crate::log_info;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub const KEY_FILE_NAME: &str = "id_ed25519";

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

pub fn configure_ssh(runner: &dyn CommandRunner, paths: &AccountPaths) -> Result<()> {
    let ssh_dir = paths.ssh_dir();
    log_info!("[SSH] Configuring SSH in {}", ssh_dir.display());

    fs::create_dir_all(&ssh_dir).map_err(|e| InstallerError::io("cannot create directory", &ssh_dir, e))?;
    set_mode(&ssh_dir, 0o700).map_err(|e| InstallerError::io("cannot set permissions", &ssh_dir, e))?;

    let key = ssh_dir.join(KEY_FILE_NAME);
    if key.exists() {
        log_info!("[SSH] Key pair {} already exists", key.display());
    } else {
        let keygen = Invocation::new("ssh-keygen")
            .args(["-t", "ed25519", "-f"])
            .path_arg(&key)
            .args(["-q", "-N", ""]);
        run_checked(runner, &keygen).map_err(|reason| InstallerError::SshSetup {
            key: key.clone(),
            reason,
        })?;
        log_info!("[SSH] Generated key pair {}", key.display());
    }

    let public_key_path = ssh_dir.join(format!("{KEY_FILE_NAME}.pub"));
    let public_key = fs::read_to_string(&public_key_path)
        .map_err(|e| InstallerError::io("cannot read public key", &public_key_path, e))?;
    authorize_key(&ssh_dir.join("authorized_keys"), public_key.trim())
}

/// Appends `public_key` to `authorized_keys` unless it is already listed.
pub fn authorize_key(authorized_keys: &Path, public_key: &str) -> Result<()> {
    let existing = match fs::read_to_string(authorized_keys) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(InstallerError::io("cannot read", authorized_keys, e)),
    };

    if existing.lines().any(|line| line.trim() == public_key) {
        log_info!("[SSH] Public key already authorized");
    } else {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(authorized_keys)
            .map_err(|e| InstallerError::io("cannot open", authorized_keys, e))?;
        let separator = if existing.is_empty() || existing.ends_with('\n') { "" } else { "\n" };
        writeln!(file, "{separator}{public_key}")
            .map_err(|e| InstallerError::io("cannot write", authorized_keys, e))?;
        log_info!("[SSH] Public key added to {}", authorized_keys.display());
    }

    set_mode(authorized_keys, 0o600).map_err(|e| InstallerError::io("cannot set permissions", authorized_keys, e))
}
