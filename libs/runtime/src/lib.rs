//! Process-level plumbing shared by Clog binaries: layered configuration,
//! logging, home directory resolution and database bootstrap.

pub mod config;
pub mod db;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
