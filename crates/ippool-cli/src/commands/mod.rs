// Command modules for CLI

/// Flat pool commands: create-pool, reserve-size, reserve-ip
pub mod pool;

/// Environment commands: reserve-vnet, reserve-subnet, generate-tf
pub mod environment;

use crate::cli::{Cli, Command};
use crate::config::CliConfig;
use crate::state_file::{self, StateDocument};
use std::io::Write;
use std::path::Path;

/// Execute one parsed command, writing its output to `out`
pub fn run(cli: Cli, config: &CliConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Command::CreatePool {
            state_file,
            pool,
            environment,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            pool::create_pool(&path, &pool, environment)
        }

        Command::ReserveSize {
            state_file,
            size,
            key,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            pool::reserve_size(&path, size, &key, out)
        }

        Command::ReserveIp {
            state_file,
            ip,
            key,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            pool::reserve_ip(&path, &ip, &key, out)
        }

        Command::ReserveVnet {
            state_file,
            key,
            block,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            environment::reserve_vnet(&path, &key, block.request()?, out)
        }

        Command::ReserveSubnet {
            state_file,
            vnet_key,
            key,
            block,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            environment::reserve_subnet(&path, &vnet_key, &key, block.request()?, out)
        }

        Command::GenerateTf {
            state_file,
            variable_name,
        } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            let variable_name = variable_name.unwrap_or_else(|| config.terraform.variable_name.clone());
            environment::generate_tf(&path, &variable_name, out)
        }

        Command::Show { state_file } => {
            let path = config.resolve_state_file(state_file.as_deref())?;
            show(&path, out)
        }
    }
}

fn show(path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let text = match state_file::load_document(path)? {
        StateDocument::Pool(state) => state.to_json()?,
        StateDocument::Environment(state) => state.to_json()?,
    };
    writeln!(out, "{text}")?;
    Ok(())
}
