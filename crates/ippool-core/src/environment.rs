//! Address environments: an address space split into virtual networks and subnets
//!
//! The environment owns one allocator for its whole address space. Each virtual network
//! is a block reserved from that allocator and owns a fresh allocator rooted at the
//! block; subnets are blocks reserved from their virtual network's allocator.
//!
//! Keys are unique per parent collection and compared case-sensitively. The allocators
//! underneath additionally refuse keys that differ only by case or surrounding spaces.

use crate::address::Address;
use crate::allocator::{BlockRequest, CidrAllocator};
use crate::errors::{IpPoolError, Result};
use crate::state::{EnvironmentState, SubnetState, VirtualNetworkState};
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

/// A subnet reserved inside a virtual network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    key: String,
    address_space: Address,
}

impl Subnet {
    /// Subnet key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reserved block
    pub fn address_space(&self) -> &Address {
        &self.address_space
    }
}

/// A virtual network and the subnets carved out of it
#[derive(Debug, Clone)]
pub struct VirtualNetwork {
    key: String,
    allocator: CidrAllocator,
    subnets: IndexMap<String, Subnet>,
}

impl VirtualNetwork {
    fn new(key: &str, address_space: Address) -> Result<Self> {
        Ok(Self {
            key: key.to_string(),
            allocator: CidrAllocator::new(address_space)?,
            subnets: IndexMap::new(),
        })
    }

    /// Virtual network key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Block reserved for this virtual network
    pub fn address_space(&self) -> &Address {
        self.allocator.root()
    }

    /// Allocator handing out this network's subnets
    pub fn allocator(&self) -> &CidrAllocator {
        &self.allocator
    }

    /// Subnets in insertion order
    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.values()
    }

    /// Subnet with exactly this key
    pub fn get_subnet_by_key(&self, key: &str) -> Result<&Subnet> {
        self.subnets
            .get(key)
            .ok_or_else(|| IpPoolError::business(format!("subnet not found: {key}")))
    }

    /// Reserve a subnet, either an exact block or the first free block of a size
    pub fn add_subnet(&mut self, key: &str, request: impl Into<BlockRequest>) -> Result<&Subnet> {
        match self.subnets.entry(key.to_string()) {
            Entry::Occupied(_) => Err(IpPoolError::business(format!(
                "subnet already exists: {key}"
            ))),
            Entry::Vacant(slot) => {
                let address_space = self.allocator.allocate(key, request.into())?;
                debug!("Added subnet {} ({}) to {}", key, address_space, self.key);
                Ok(slot.insert(Subnet {
                    key: key.to_string(),
                    address_space,
                }))
            }
        }
    }
}

/// Root of the three-level hierarchy
#[derive(Debug, Clone)]
pub struct AddressEnvironment {
    root: CidrAllocator,
    virtual_networks: IndexMap<String, VirtualNetwork>,
}

impl AddressEnvironment {
    /// Empty environment over `address_space`, which must carry a prefix length
    pub fn new(address_space: Address) -> Result<Self> {
        Ok(Self {
            root: CidrAllocator::new(address_space)?,
            virtual_networks: IndexMap::new(),
        })
    }

    /// The environment's whole address space
    pub fn address_space(&self) -> &Address {
        self.root.root()
    }

    /// Allocator handing out virtual network blocks
    pub fn allocator(&self) -> &CidrAllocator {
        &self.root
    }

    /// Virtual networks in insertion order
    pub fn virtual_networks(&self) -> impl Iterator<Item = &VirtualNetwork> {
        self.virtual_networks.values()
    }

    /// Virtual network with exactly this key
    pub fn get_virtual_network_by_key(&self, key: &str) -> Result<&VirtualNetwork> {
        self.virtual_networks
            .get(key)
            .ok_or_else(|| IpPoolError::business(format!("virtual network not found: {key}")))
    }

    /// Mutable access to the virtual network with exactly this key
    pub fn get_virtual_network_by_key_mut(&mut self, key: &str) -> Result<&mut VirtualNetwork> {
        self.virtual_networks
            .get_mut(key)
            .ok_or_else(|| IpPoolError::business(format!("virtual network not found: {key}")))
    }

    /// Reserve a virtual network block and give it its own allocator
    pub fn add_virtual_network(
        &mut self,
        key: &str,
        request: impl Into<BlockRequest>,
    ) -> Result<&mut VirtualNetwork> {
        match self.virtual_networks.entry(key.to_string()) {
            Entry::Occupied(_) => Err(IpPoolError::business(format!(
                "virtual network already exists: {key}"
            ))),
            Entry::Vacant(slot) => {
                let block = self.root.allocate(key, request.into())?;
                debug!("Added virtual network {} ({})", key, block);
                Ok(slot.insert(VirtualNetwork::new(key, block)?))
            }
        }
    }

    /// Nested snapshot of every virtual network and subnet
    pub fn to_state(&self) -> EnvironmentState {
        EnvironmentState {
            address_space: self.address_space().to_string(),
            virtual_networks: self
                .virtual_networks()
                .map(|vnet| {
                    let subnets = vnet
                        .subnets()
                        .map(|subnet| {
                            (
                                subnet.key.clone(),
                                SubnetState {
                                    address_space: subnet.address_space.to_string(),
                                },
                            )
                        })
                        .collect();
                    (
                        vnet.key.clone(),
                        VirtualNetworkState {
                            address_space: vnet.address_space().to_string(),
                            subnets,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Rebuild an environment by replaying every virtual network and subnet as exact
    /// reservations, in stored order
    pub fn from_state(state: &EnvironmentState) -> Result<Self> {
        let mut env = Self::new(state.address_space.parse()?)?;
        for (vnet_key, vnet_state) in &state.virtual_networks {
            let block: Address = vnet_state.address_space.parse()?;
            let vnet = env.add_virtual_network(vnet_key, block)?;
            for (subnet_key, subnet_state) in &vnet_state.subnets {
                let block: Address = subnet_state.address_space.parse()?;
                vnet.add_subnet(subnet_key, block)?;
            }
        }
        Ok(env)
    }
}
