//! Error taxonomy of the bootstrap sequence.
//!
//! Every stage returns one of these kinds on its first failure; the command
//! layer adds context and `main` turns any of them into exit code 1.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstallerError>;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("cannot read platform descriptor {path}: {source}")]
    Detection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported platform: no package definition for {family} {version}")]
    UnsupportedPlatform { family: String, version: String },

    #[error("no supported package manager found (looked for {candidates})")]
    NoPackageManager { candidates: String },

    #[error("{manager} failed to install [{packages}]: {output}")]
    PackageInstall {
        manager: String,
        packages: String,
        output: String,
    },

    #[error("post-installation hook '{hook}' failed: {reason}")]
    PostInstallHook { hook: String, reason: String },

    #[error("cannot create runtime environment at {path}: {reason}")]
    EnvironmentCreation { path: PathBuf, reason: String },

    #[error("no runtime packages were installed into {path}")]
    NoPackagesInstalled { path: PathBuf },

    #[error("cannot provision account '{account}' ({step}): {reason}")]
    AccountProvision {
        account: String,
        step: &'static str,
        reason: String,
    },

    #[error("cannot generate SSH key {key}: {reason}")]
    SshSetup { key: PathBuf, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{path}: {reason}")]
    PrerequisiteValidation { path: PathBuf, reason: String },

    #[error("{check} check failed: {reason}")]
    SystemCheck { check: &'static str, reason: String },

    #[error("failed to install collection from {artifact}: {reason}")]
    ArtifactInstall { artifact: PathBuf, reason: String },

    #[error("failed to install core variables from {file}: {reason}")]
    CoreVariablesInstall { file: PathBuf, reason: String },

    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("failed to update {path}: {source}")]
    EnvironmentFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("installation status: {0}")]
    Status(String),

    #[error("{context} at {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallerError {
    /// Wraps a filesystem error with the operation and path that produced it.
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
