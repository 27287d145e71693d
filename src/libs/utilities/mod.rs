// Low-level helpers shared by the installers: host detection, process
// execution, file edits and downloads.

// OS identity detection from `/etc/os-release`.
pub mod platform;
// `CommandRunner` and the host implementation.
pub mod process;
pub mod file_operations;
// Single-file HTTP downloads.
pub mod assets;
