use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::schemas::config::{DEFAULT_HOME, DEFAULT_USER};

/// Defines the command-line interface (CLI) for 'bluebanquise-installer'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser, Debug)]
#[command(name = "bluebanquise-installer", version)]
#[command(about = "Install BlueBanquise online, offline or from a staged download")]
pub struct Cli {
    /// Enables detailed debug output on the terminal.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Account options shared by the installing commands and `status`.
#[derive(Args, Debug, Clone)]
pub struct AccountArgs {
    /// Name of the BlueBanquise service account.
    #[arg(short, long, default_value = DEFAULT_USER)]
    pub user: String,

    /// Home directory of the service account.
    #[arg(short = 'H', long, default_value = DEFAULT_HOME)]
    pub home: PathBuf,
}

/// Enumerates all supported subcommands with their specific arguments.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install BlueBanquise, fetching collections and variables from the network.
    Online {
        #[command(flatten)]
        account: AccountArgs,

        /// Do not build the Python environment.
        #[arg(short = 'e', long)]
        skip_environment: bool,
    },
    /// Install BlueBanquise from locally staged collections.
    /// Exactly one of `--collections-path` and `--tarball-path` is required.
    #[command(group(
        ArgGroup::new("collection_source")
            .required(true)
            .args(["collections_path", "tarball_path"])
    ))]
    Offline {
        #[command(flatten)]
        account: AccountArgs,

        /// Do not build the Python environment.
        #[arg(short = 'e', long)]
        skip_environment: bool,

        /// Directory holding downloaded collections.
        #[arg(short, long)]
        collections_path: Option<PathBuf>,

        /// A collection tarball, or a directory of tarballs.
        #[arg(short, long)]
        tarball_path: Option<PathBuf>,

        /// Directory with `requirements.txt` and the Python packages it lists.
        #[arg(short, long)]
        requirements_path: Option<PathBuf>,

        /// A core variables file, or a directory of them.
        #[arg(long)]
        core_vars_path: Option<PathBuf>,
    },
    /// Stage collections, Python packages or core variables for an offline install.
    #[command(group(
        ArgGroup::new("artifact_type")
            .required(true)
            .multiple(true)
            .args(["collections", "tarball", "requirements", "core_vars"])
    ))]
    Download {
        /// Directory to download into.
        #[arg(short, long)]
        path: PathBuf,

        /// Download the collections into `<path>/collections`.
        #[arg(short, long)]
        collections: bool,

        /// Download the collections as tarballs directly into `<path>`.
        #[arg(short, long)]
        tarball: bool,

        /// Download the Python packages and their `requirements.txt`.
        #[arg(short, long)]
        requirements: bool,

        /// Download the core variables file.
        #[arg(long)]
        core_vars: bool,
    },
    /// Check an existing installation.
    Status {
        /// Name of the BlueBanquise service account.
        #[arg(short, long, default_value = DEFAULT_USER)]
        user: String,

        /// Home directory; looked up from the account when omitted.
        #[arg(short = 'H', long)]
        home: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn offline_accepts_exactly_one_collection_source() {
        assert!(Cli::try_parse_from(["bluebanquise-installer", "offline", "-c", "/a"]).is_ok());
        assert!(Cli::try_parse_from(["bluebanquise-installer", "offline", "-t", "/a.tgz"]).is_ok());
        assert!(Cli::try_parse_from(["bluebanquise-installer", "offline", "-c", "/a", "-t", "/b"]).is_err());
        assert!(Cli::try_parse_from(["bluebanquise-installer", "offline"]).is_err());
    }

    #[test]
    fn download_needs_a_type_flag() {
        assert!(Cli::try_parse_from(["bluebanquise-installer", "download", "-p", "/tmp/x"]).is_err());
        let cli = Cli::try_parse_from(["bluebanquise-installer", "download", "-p", "/tmp/x", "-r", "--core-vars"]).unwrap();
        match cli.command {
            Commands::Download { requirements, core_vars, collections, .. } => {
                assert!(requirements && core_vars && !collections);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn account_defaults() {
        let cli = Cli::try_parse_from(["bluebanquise-installer", "--debug", "online"]).unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Online { account, skip_environment } => {
                assert_eq!(account.user, DEFAULT_USER);
                assert_eq!(account.home, PathBuf::from(DEFAULT_HOME));
                assert!(!skip_environment);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
