// This module is the hub of the individual installation stages.
//
// Each submodule owns one concern of the bootstrap and exposes plain functions
// taking a `CommandRunner` and the paths they act on. Ordering between them is
// decided in `libs::bootstrap`, never here.

/// Detects the host package manager and installs OS packages with it.
pub(crate) mod package_manager;

/// Platform quirk fixes that run right after OS packages are installed.
pub(crate) mod post_hooks;

/// Service account, group and passwordless privilege grant.
pub(crate) mod account;

/// The Python virtual environment: interpreter choice, creation, packages.
pub(crate) mod runtime_env;

/// Line-level edits of `.bashrc` and the shared sudoers file.
pub(crate) mod shellrc;

pub(crate) mod ssh;

/// Ansible collections, online and from staged archives.
pub(crate) mod collections;

/// Core inventory variables (`bb_core.yml`).
pub(crate) mod core_vars;
