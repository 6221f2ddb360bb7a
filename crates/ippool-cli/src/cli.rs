//! Argument definitions

use clap::{Args, Parser, Subcommand};
use ippool_core::{Address, BlockRequest};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ippool")]
#[command(about = "manage a pool of CIDR blocks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "ippool.toml")]
    pub config: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty pool (or environment) state file
    CreatePool {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// The CIDR pool to create
        #[arg(long)]
        pool: String,

        /// Create an environment of virtual networks instead of a flat pool
        #[arg(long)]
        environment: bool,
    },

    /// Reserve the first free block of a size from a pool
    ReserveSize {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Number of free bits in the block to reserve
        #[arg(long)]
        size: u8,

        /// The key to use for the reservation
        #[arg(long)]
        key: String,
    },

    /// Reserve an exact block from a pool
    ReserveIp {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// The block (in CIDR notation) to reserve
        #[arg(long)]
        ip: String,

        /// The key to use for the reservation
        #[arg(long)]
        key: String,
    },

    /// Reserve a virtual network in an environment
    ReserveVnet {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// The key of the virtual network
        #[arg(long)]
        key: String,

        #[command(flatten)]
        block: BlockArgs,
    },

    /// Reserve a subnet inside a virtual network
    ReserveSubnet {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// The key of the virtual network to carve the subnet from
        #[arg(long)]
        vnet_key: String,

        /// The key of the subnet
        #[arg(long)]
        key: String,

        #[command(flatten)]
        block: BlockArgs,
    },

    /// Print a Terraform variable describing an environment
    GenerateTf {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,

        /// Name of the generated variable
        #[arg(long)]
        variable_name: Option<String>,
    },

    /// Print the state file
    Show {
        /// The location of the state file
        #[arg(long)]
        state_file: Option<PathBuf>,
    },
}

/// Either an exact block or a size, never both
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct BlockArgs {
    /// Number of free bits in the block to reserve
    #[arg(long)]
    pub size: Option<u8>,

    /// The block (in CIDR notation) to reserve
    #[arg(long)]
    pub ip: Option<String>,
}

impl BlockArgs {
    /// Allocation request described by the flags
    pub fn request(&self) -> ippool_core::Result<BlockRequest> {
        match (&self.ip, self.size) {
            (Some(ip), _) => Ok(BlockRequest::Address(ip.parse::<Address>()?)),
            (None, Some(size)) => Ok(BlockRequest::Size(size)),
            (None, None) => Err(ippool_core::IpPoolError::business(
                "either --size or --ip is required",
            )),
        }
    }
}
