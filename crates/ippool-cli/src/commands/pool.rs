//! Flat pool commands

use crate::state_file;
use ippool_core::{Address, AddressEnvironment, CidrAllocator};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write a fresh pool, or an empty environment when `environment` is set
pub fn create_pool(path: &Path, pool: &str, environment: bool) -> anyhow::Result<()> {
    let address: Address = pool.parse()?;
    if environment {
        let env = AddressEnvironment::new(address)?;
        state_file::save_environment(path, &env)?;
        info!("Created environment {} in {}", address, path.display());
    } else {
        let allocator = CidrAllocator::new(address)?;
        state_file::save_pool(path, &allocator)?;
        info!("Created pool {} in {}", address, path.display());
    }
    Ok(())
}

/// Reserve the first free block with `size` free bits
pub fn reserve_size(path: &Path, size: u8, key: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let mut allocator = state_file::load_pool(path)?;
    let reserved = allocator.allocate_by_size(key, size)?;
    state_file::save_pool(path, &allocator)?;
    writeln!(out, "reserved: {reserved}")?;
    info!("Reserved {} for {} in {}", reserved, key, path.display());
    Ok(())
}

/// Reserve exactly the block `ip`
pub fn reserve_ip(path: &Path, ip: &str, key: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let address: Address = ip.parse()?;
    let mut allocator = state_file::load_pool(path)?;
    let reserved = allocator.allocate_exact(key, &address)?;
    state_file::save_pool(path, &allocator)?;
    writeln!(out, "reserved: {reserved}")?;
    info!("Reserved {} for {} in {}", reserved, key, path.display());
    Ok(())
}
