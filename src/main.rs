// Entry point of `bluebanquise-installer`.
// Parses the command line, sets up logging and dispatches to the command
// modules. Any error ends the process with exit code 1.

mod cli;
mod commands;
mod error;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands};
use commands::offline::OfflineArgs;
use schemas::config::DownloadConfig;

fn main() {
    let cli = Cli::parse();
    logger::init(cli.debug);
    log_debug!("[Main] Parsed command line: {:?}", cli.command);

    let outcome = match cli.command {
        Commands::Online {
            account,
            skip_environment,
        } => commands::online::run(account, skip_environment),
        Commands::Offline {
            account,
            skip_environment,
            collections_path,
            tarball_path,
            requirements_path,
            core_vars_path,
        } => commands::offline::run(
            account,
            skip_environment,
            OfflineArgs {
                collections_path,
                tarball_path,
                requirements_path,
                core_vars_path,
            },
        ),
        Commands::Download {
            path,
            collections,
            tarball,
            requirements,
            core_vars,
        } => commands::download::run(DownloadConfig {
            path,
            requirements,
            collections,
            tarball,
            core_vars,
        }),
        Commands::Status { user, home } => commands::status::run(user, home),
    };

    if let Err(err) = outcome {
        log_error!("{:#}", err);
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
