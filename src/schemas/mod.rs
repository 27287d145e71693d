// Data definitions: run configuration and the platform table.

pub mod config;
pub mod platform_table;
