//! ippool CLI Library
//!
//! Command-line front end for `ippool-core`. Each command loads a JSON state file,
//! performs one allocation against the pool or environment it describes, prints the
//! result and writes the state back.
//!
//! The binary in `main.rs` only parses arguments, installs logging and maps failures
//! to an exit code; everything else lives here so it can be driven from tests.

#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod state_file;
pub mod terraform;

pub use cli::{BlockArgs, Cli, Command};
pub use commands::run;
pub use config::{CliConfig, TerraformConfig};

use ippool_core::IpPoolError;

/// CLI error types
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File system error: {0}")]
    FileSystem(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Text printed for a failed command.
///
/// User-correctable failures print their bare message; anything else is reported as
/// unhandled with the full error chain.
pub fn failure_message(err: &anyhow::Error) -> String {
    let business = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<IpPoolError>())
        .filter(|cause| cause.is_business());
    match business {
        Some(cause) => cause.to_string(),
        None => format!("unhandled error: {err:#}"),
    }
}
