// Run configuration.
//
// Built once from the parsed command line and handed by reference to every
// stage of the bootstrap. Nothing in the core reads flags from anywhere else.

use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_USER: &str = "bluebanquise";
pub const DEFAULT_HOME: &str = "/var/lib/bluebanquise";
pub const ACCOUNT_UID: u32 = 377;
pub const ACCOUNT_GID: u32 = 377;
pub const ACCOUNT_SHELL: &str = "/bin/bash";

/// Host-global locations the installer reads or writes outside the account home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostLayout {
    pub os_release: PathBuf,
    pub sudoers_dir: PathBuf,
}

impl Default for HostLayout {
    fn default() -> Self {
        HostLayout {
            os_release: PathBuf::from("/etc/os-release"),
            sudoers_dir: PathBuf::from("/etc/sudoers.d"),
        }
    }
}

impl HostLayout {
    /// Per-account passwordless grant.
    pub fn account_sudoers_file(&self, account: &str) -> PathBuf {
        self.sudoers_dir.join(account)
    }

    /// Product-wide privilege settings shared by every account.
    pub fn shared_sudoers_file(&self) -> PathBuf {
        self.sudoers_dir.join("bluebanquise")
    }
}

/// Where collections and runtime packages come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InstallSource {
    /// Fetch everything from the network.
    Online,
    /// Use pre-staged local paths only.
    Offline(OfflineSources),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfflineSources {
    /// A directory of collection archives or a single archive.
    pub collections: CollectionSource,
    /// Directory holding `requirements.txt` and the wheels/sdists it names.
    pub requirements: Option<PathBuf>,
    /// A variables file or a directory of them.
    pub core_vars: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CollectionSource {
    /// `--collections-path`: a non-empty staging directory.
    Directory(PathBuf),
    /// `--tarball-path`: one archive, or a directory holding archives.
    Tarball(PathBuf),
}

impl CollectionSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            CollectionSource::Directory(p) | CollectionSource::Tarball(p) => p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallConfig {
    pub user: String,
    pub home: PathBuf,
    pub skip_environment: bool,
    pub source: InstallSource,
}

impl InstallConfig {
    pub fn is_offline(&self) -> bool {
        matches!(self.source, InstallSource::Offline(_))
    }
}

/// What `download` should stage, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadConfig {
    pub path: PathBuf,
    pub requirements: bool,
    pub collections: bool,
    /// Put collection archives directly in `path` instead of `path/collections`.
    pub tarball: bool,
    pub core_vars: bool,
}

impl DownloadConfig {
    pub fn collections_destination(&self) -> PathBuf {
        if self.tarball {
            self.path.clone()
        } else {
            self.path.join("collections")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudoers_files_live_in_the_layout_directory() {
        let layout = HostLayout::default();
        assert_eq!(layout.account_sudoers_file("svc"), PathBuf::from("/etc/sudoers.d/svc"));
        assert_eq!(
            layout.shared_sudoers_file(),
            PathBuf::from("/etc/sudoers.d/bluebanquise")
        );
    }

    #[test]
    fn tarball_downloads_land_in_the_staging_root() {
        let mut cfg = DownloadConfig {
            path: PathBuf::from("/srv/stage"),
            requirements: false,
            collections: true,
            tarball: false,
            core_vars: false,
        };
        assert_eq!(cfg.collections_destination(), PathBuf::from("/srv/stage/collections"));
        cfg.tarball = true;
        assert_eq!(cfg.collections_destination(), PathBuf::from("/srv/stage"));
    }
}
