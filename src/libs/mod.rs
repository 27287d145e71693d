// Orchestration and shared path logic.

// The ordered bootstrap sequence used by `online` and `offline`.
pub mod bootstrap;
// Locations under the account home.
pub mod paths;
// Source path validators and host system checks.
pub mod prerequisites;
pub mod utilities;
