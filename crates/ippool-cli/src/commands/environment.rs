//! Environment commands

use crate::state_file;
use crate::terraform::generate_terraform;
use ippool_core::BlockRequest;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Reserve a virtual network block in the environment
pub fn reserve_vnet(
    path: &Path,
    key: &str,
    request: BlockRequest,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut env = state_file::load_environment(path)?;
    let reserved = *env.add_virtual_network(key, request)?.address_space();
    state_file::save_environment(path, &env)?;
    writeln!(out, "reserved: {reserved}")?;
    info!("Reserved virtual network {} ({}) in {}", key, reserved, path.display());
    Ok(())
}

/// Reserve a subnet inside the virtual network `vnet_key`
pub fn reserve_subnet(
    path: &Path,
    vnet_key: &str,
    key: &str,
    request: BlockRequest,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut env = state_file::load_environment(path)?;
    let vnet = env.get_virtual_network_by_key_mut(vnet_key)?;
    let reserved = *vnet.add_subnet(key, request)?.address_space();
    state_file::save_environment(path, &env)?;
    writeln!(out, "reserved: {reserved}")?;
    info!(
        "Reserved subnet {} ({}) in virtual network {}",
        key, reserved, vnet_key
    );
    Ok(())
}

/// Print the Terraform variable for the environment
pub fn generate_tf(path: &Path, variable_name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let env = state_file::load_environment(path)?;
    let text = generate_terraform(&env.to_state(), variable_name)?;
    write!(out, "{text}")?;
    Ok(())
}
