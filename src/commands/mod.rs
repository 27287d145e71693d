// Register application subcommands.
// Each module corresponds to a specific `bluebanquise-installer` command-line action.

use std::path::Path;

// Installs BlueBanquise from the network.
pub mod online;
// Installs BlueBanquise from staged local artifacts.
pub mod offline;
// Stages artifacts for a later offline install.
pub mod download;
// Reports on an existing installation.
pub mod status;

/// Printed once an `online` or `offline` run has finished.
pub fn show_completion_message(user: &str, home: &Path) {
    println!();
    println!("Bootstrap done.");
    println!("You can now login as {user} user via 'su - {user}' (home: {}).", home.display());
    println!();
    println!("To use BlueBanquise, remember to set the Ansible environment variable:");
    println!("ANSIBLE_CONFIG=$HOME/bluebanquise/ansible.cfg");
    println!();
    println!("Documentation: http://bluebanquise.com/documentation/");
    println!("Help and issues: https://github.com/bluebanquise/bluebanquise/");
    println!();
}
