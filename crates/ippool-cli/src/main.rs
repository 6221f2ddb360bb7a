//! ippool command-line entry point
//!
//! Parses arguments, installs logging and turns failures into exit code 1.

use clap::error::ErrorKind;
use clap::Parser;
use ippool_cli::{failure_message, run, Cli, CliConfig};
use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return ExitCode::SUCCESS;
            }
            // Usage errors follow the same contract as command failures
            _ => {
                println!("{err}");
                return ExitCode::FAILURE;
            }
        },
    };

    let config = match CliConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr; stdout carries command output only
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    match run(cli, &config, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("Command failed: {err:?}");
            let _ = writeln!(stdout, "{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}
