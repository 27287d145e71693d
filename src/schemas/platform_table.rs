// Platform capability table.
//
// Pure data: for each canonical (family, version) the OS packages the
// installer needs and, for platforms where packages alone are not enough, the
// identifier of a post-install hook. Hook identifiers are resolved to code by
// `installers::post_hooks`, keeping this table free of behavior.

use crate::error::{InstallerError, Result};
use crate::libs::utilities::platform::OsIdentity;
use serde::Serialize;
use std::fmt;

/// Symbolic name of a platform-specific corrective action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookId {
    /// Ubuntu 20.04 ships no usable Python 3.11 package; build it from source.
    BuildPython311FromSource,
    /// openSUSE Leap installs python311 next to the default python3.
    LinkPython311AsDefault,
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookId::BuildPython311FromSource => "build-python311-from-source",
            HookId::LinkPython311AsDefault => "link-python311-as-default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformEntry {
    pub family: String,
    pub version: String,
    pub packages: Vec<String>,
    pub post_install: Option<HookId>,
}

impl PlatformEntry {
    pub fn new(family: &str, version: &str, packages: &[&str], post_install: Option<HookId>) -> Self {
        PlatformEntry {
            family: family.to_string(),
            version: version.to_string(),
            packages: packages.iter().map(|p| p.to_string()).collect(),
            post_install,
        }
    }
}

/// What the table says about one platform. An empty package list means the
/// platform is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformRequirements {
    pub packages: Vec<String>,
    pub post_install: Option<HookId>,
}

#[derive(Debug, Clone)]
pub struct PlatformTable {
    entries: Vec<PlatformEntry>,
}

impl PlatformTable {
    pub fn new(entries: Vec<PlatformEntry>) -> Self {
        PlatformTable { entries }
    }

    /// The platforms BlueBanquise supports.
    pub fn builtin() -> Self {
        const UBUNTU_MODERN: &[&str] = &[
            "python3.12", "python3.12-pip", "python3.12-venv", "ssh", "curl", "git",
        ];
        const UBUNTU_FOCAL: &[&str] = &[
            "build-essential", "zlib1g-dev", "libncurses5-dev", "libgdbm-dev",
            "libnss3-dev", "libssl-dev", "libreadline-dev", "libffi-dev",
            "libsqlite3-dev", "wget", "libbz2-dev", "pkg-config", "ssh",
            "curl", "git",
        ];
        const LEAP: &[&str] = &[
            "python3", "python3-pip", "python311", "python311-pip", "git", "openssh", "curl",
        ];

        PlatformTable::new(vec![
            PlatformEntry::new("ubuntu", "24.04", UBUNTU_MODERN, None),
            PlatformEntry::new("ubuntu", "22.04", UBUNTU_MODERN, None),
            PlatformEntry::new("ubuntu", "20.04", UBUNTU_FOCAL, Some(HookId::BuildPython311FromSource)),
            PlatformEntry::new(
                "rhel",
                "7",
                &["epel-release", "openssh", "centos-release-scl-rh", "centos-release-scl", "rh-python38"],
                None,
            ),
            PlatformEntry::new(
                "rhel",
                "8",
                &["git", "python39", "python3-pip", "python3-policycoreutils", "openssh-clients", "python39-setuptools"],
                None,
            ),
            PlatformEntry::new(
                "rhel",
                "9",
                &["git", "python3.12", "python3.12-pip", "python3-policycoreutils", "openssh-clients", "python3.12-setuptools"],
                None,
            ),
            PlatformEntry::new(
                "debian",
                "11",
                &["python3", "python3-pip", "python3-venv", "git", "ssh", "curl"],
                None,
            ),
            PlatformEntry::new(
                "debian",
                "12",
                &["python3.12", "python3.12-pip", "python3.12-venv", "git", "ssh", "curl"],
                None,
            ),
            PlatformEntry::new("opensuse-leap", "15.5", LEAP, Some(HookId::LinkPython311AsDefault)),
            PlatformEntry::new("opensuse-leap", "15.6", LEAP, Some(HookId::LinkPython311AsDefault)),
        ])
    }

    pub fn entries(&self) -> &[PlatformEntry] {
        &self.entries
    }

    /// First row matching `identity` exactly. A miss yields empty requirements.
    pub fn lookup(&self, identity: &OsIdentity) -> PlatformRequirements {
        self.entries
            .iter()
            .find(|e| identity.is(&e.family, &e.version))
            .map(|e| PlatformRequirements {
                packages: e.packages.clone(),
                post_install: e.post_install,
            })
            .unwrap_or_default()
    }

    /// Like `lookup`, but an unsupported platform is an error.
    pub fn require(&self, identity: &OsIdentity) -> Result<PlatformRequirements> {
        let requirements = self.lookup(identity);
        if requirements.packages.is_empty() {
            return Err(InstallerError::UnsupportedPlatform {
                family: identity.family.clone(),
                version: identity.version.clone(),
            });
        }
        Ok(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_platform_yields_empty_packages() {
        let table = PlatformTable::builtin();
        let req = table.lookup(&OsIdentity::new("arch", "rolling"));
        assert!(req.packages.is_empty());
        assert!(req.post_install.is_none());
        assert!(matches!(
            table.require(&OsIdentity::new("arch", "rolling")),
            Err(InstallerError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn rhel_rows_are_keyed_by_major_version() {
        let table = PlatformTable::builtin();
        assert!(!table.lookup(&OsIdentity::new("rhel", "9")).packages.is_empty());
        assert!(table.lookup(&OsIdentity::new("rhel", "9.3")).packages.is_empty());
    }

    #[test]
    fn hooks_are_attached_to_quirky_platforms() {
        let table = PlatformTable::builtin();
        assert_eq!(
            table.lookup(&OsIdentity::new("ubuntu", "20.04")).post_install,
            Some(HookId::BuildPython311FromSource)
        );
        assert_eq!(
            table.lookup(&OsIdentity::new("opensuse-leap", "15.6")).post_install,
            Some(HookId::LinkPython311AsDefault)
        );
        assert_eq!(table.lookup(&OsIdentity::new("ubuntu", "22.04")).post_install, None);
    }

    #[test]
    fn first_matching_row_wins() {
        let table = PlatformTable::new(vec![
            PlatformEntry::new("ubuntu", "22.04", &["git"], None),
            PlatformEntry::new("ubuntu", "22.04", &["curl"], Some(HookId::LinkPython311AsDefault)),
        ]);
        let req = table.lookup(&OsIdentity::new("ubuntu", "22.04"));
        assert_eq!(req.packages, vec!["git"]);
        assert_eq!(req.post_install, None);
    }

    #[test]
    fn hook_ids_serialize_kebab_case() {
        let json = serde_json::to_string(&HookId::LinkPython311AsDefault).unwrap();
        assert_eq!(json, "\"link-python311-as-default\"");
    }
}
