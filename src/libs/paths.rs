// Path resolution for everything the installer places under the account home.
// All modes (online, offline, status) derive their locations from here so
// they agree on where the environment, collections and variables live.

use std::path::{Path, PathBuf};

pub const VENV_DIR_NAME: &str = "ansible_venv";
pub const PRODUCT_DIR_NAME: &str = "bluebanquise";
pub const CORE_VARS_FILE_NAME: &str = "bb_core.yml";
pub const MANIFEST_FILE_NAME: &str = "requirements.txt";

/// Locations derived from the account home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPaths {
    home: PathBuf,
}

impl AccountPaths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        AccountPaths { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.home.join(VENV_DIR_NAME)
    }

    pub fn venv_bin(&self) -> PathBuf {
        self.venv_dir().join("bin")
    }

    pub fn venv_python(&self) -> PathBuf {
        self.venv_bin().join("python3")
    }

    pub fn activate_script(&self) -> PathBuf {
        self.venv_bin().join("activate")
    }

    pub fn ansible(&self) -> PathBuf {
        self.venv_bin().join("ansible")
    }

    pub fn ansible_galaxy(&self) -> PathBuf {
        self.venv_bin().join("ansible-galaxy")
    }

    pub fn bashrc(&self) -> PathBuf {
        self.home.join(".bashrc")
    }

    pub fn ssh_dir(&self) -> PathBuf {
        self.home.join(".ssh")
    }

    pub fn product_dir(&self) -> PathBuf {
        self.home.join(PRODUCT_DIR_NAME)
    }

    pub fn group_vars_dir(&self) -> PathBuf {
        self.product_dir()
            .join("inventory")
            .join("group_vars")
            .join("all")
    }

    pub fn core_vars_file(&self) -> PathBuf {
        self.group_vars_dir().join(CORE_VARS_FILE_NAME)
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.home.join(".ansible").join("collections")
    }

    pub fn infrastructure_collection(&self) -> PathBuf {
        self.collections_dir()
            .join("ansible_collections")
            .join("bluebanquise")
            .join("infrastructure")
    }
}

/// Candidate home directories for an account whose passwd entry gives none.
pub fn fallback_homes(user: &str) -> Vec<PathBuf> {
    vec![
        PathBuf::from(format!("/home/{user}")),
        PathBuf::from(format!("/var/lib/{user}")),
        PathBuf::from(format!("/opt/{user}")),
    ]
}

/// Pulls the home directory (sixth field) out of a `getent passwd` line.
pub fn home_from_passwd_entry(entry: &str) -> Option<PathBuf> {
    let line = entry.lines().next()?;
    let home = line.split(':').nth(5)?;
    if home.is_empty() {
        None
    } else {
        Some(PathBuf::from(home))
    }
}
