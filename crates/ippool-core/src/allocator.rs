//! CIDR allocation engine
//!
//! A [`CidrAllocator`] owns one binary trie rooted at a pool block. Walking the trie one
//! address bit at a time narrows the block by one prefix bit, so a node at depth `d`
//! below a `/p` root is a `/(p + d)` block. Reserving a node claims its whole block; a
//! reservation is only accepted when no enclosing and no enclosed block is reserved.
//!
//! Two entry points exist:
//! - [`CidrAllocator::allocate_exact`] reserves a caller-chosen block.
//! - [`CidrAllocator::allocate_by_size`] reserves the first free block of a given size,
//!   searching depth-first with the 0 branch before the 1 branch.
//!
//! Every validation runs before the reservation is committed. Trie nodes created while
//! walking are removed again if the allocation fails, so a failed call leaves the trie
//! exactly as it was.

use crate::address::{network_mask, Address, ADDRESS_BITS};
use crate::errors::{IpPoolError, Result};
use crate::state::CidrState;
use crate::trie::{NodeId, Trie};
use std::fmt;
use tracing::{debug, trace};

/// What a caller asks the allocator to reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRequest {
    /// Exactly this block
    Address(Address),
    /// The first free block with this many free (host) bits
    Size(u8),
}

impl From<Address> for BlockRequest {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<u8> for BlockRequest {
    fn from(size: u8) -> Self {
        Self::Size(size)
    }
}

/// Allocator for one pool of addresses.
#[derive(Debug, Clone)]
pub struct CidrAllocator {
    root: Address,
    root_prefix: u8,
    trie: Trie,
}

impl CidrAllocator {
    /// Empty allocator for the pool `root`, which must carry a prefix length.
    pub fn new(root: Address) -> Result<Self> {
        let root_prefix = root
            .prefix_len()
            .ok_or_else(|| IpPoolError::business(format!("prefix size is required: {root}")))?;
        Ok(Self {
            root,
            root_prefix,
            trie: Trie::new(ADDRESS_BITS - root_prefix),
        })
    }

    /// Rebuild an allocator by replaying every persisted reservation in stored order
    pub fn from_state(state: &CidrState) -> Result<Self> {
        let mut allocator = Self::new(state.pool.parse()?)?;
        for (key, block) in &state.reserved {
            let block: Address = block.parse()?;
            allocator.allocate_exact(key, &block)?;
        }
        debug!(
            "Restored pool {} with {} reservations",
            allocator.root,
            state.reserved.len()
        );
        Ok(allocator)
    }

    /// Flat snapshot of every reservation, keyed by reservation key
    pub fn to_state(&self) -> CidrState {
        CidrState {
            pool: self.root.to_string(),
            reserved: self
                .reservations()
                .into_iter()
                .map(|(key, block)| (key, block.to_string()))
                .collect(),
        }
    }

    /// The pool block this allocator hands out
    pub fn root(&self) -> &Address {
        &self.root
    }

    /// Free bits below the pool prefix
    pub fn free_bits(&self) -> u8 {
        ADDRESS_BITS - self.root_prefix
    }

    /// Reserve according to `request`
    pub fn allocate(&mut self, key: &str, request: BlockRequest) -> Result<Address> {
        match request {
            BlockRequest::Address(address) => self.allocate_exact(key, &address),
            BlockRequest::Size(size) => self.allocate_by_size(key, size),
        }
    }

    /// Reserve exactly the block `address`.
    ///
    /// The block must carry a prefix length no shorter than the pool's and must lie
    /// inside the pool. It conflicts with any reservation it contains, including an
    /// identical one. Walking through an already reserved enclosing block is reported
    /// as an [`IpPoolError::Invariant`].
    pub fn allocate_exact(&mut self, key: &str, address: &Address) -> Result<Address> {
        let Some(prefix) = address.prefix_len() else {
            return Err(IpPoolError::business(format!(
                "prefix size is required: {address}"
            )));
        };
        if prefix < self.root_prefix {
            return Err(IpPoolError::business(format!(
                "prefix size is too small: {address}"
            )));
        }
        let mask = network_mask(self.root_prefix);
        if address.value() & mask != self.root.value() & mask {
            return Err(IpPoolError::business(format!(
                "IP prefix does not match the root IP prefix: {address}"
            )));
        }
        let key = self.ensure_key_available(key)?;

        let mark = self.trie.mark();
        let mut current = NodeId::ROOT;
        for step in 0..(prefix - self.root_prefix) {
            if let Some(owner) = self.trie.node(current).owner_key.clone() {
                let enclosing = self.address_of(current);
                self.discard_since(mark);
                return Err(IpPoolError::invariant(format!(
                    "already reserved: {enclosing} (key '{owner}') encloses requested reservation {address} at depth {step}"
                )));
            }
            let shift = u32::from(ADDRESS_BITS - 1 - (self.root_prefix + step));
            let bit = ((address.value() >> shift) & 1) as u8;
            current = match self.trie.child_or_insert(current, bit) {
                Ok(child) => child,
                Err(err) => {
                    self.discard_since(mark);
                    return Err(err);
                }
            };
        }

        if let Some(conflict) = self.trie.first_reserved_in_subtree(current) {
            let existing = self.address_of(conflict);
            debug!(
                "Reservation {} conflicts with {} held by {:?}",
                address,
                existing,
                self.trie.node(conflict).owner_key
            );
            self.discard_since(mark);
            return Err(IpPoolError::business(format!(
                "the requested reservation {address} conflicts with {existing}"
            )));
        }

        Ok(self.commit(current, key))
    }

    /// Reserve the first free block with `mask_bits` free bits.
    ///
    /// The key is trimmed and lower-cased before it is checked and stored.
    pub fn allocate_by_size(&mut self, key: &str, mask_bits: u8) -> Result<Address> {
        if mask_bits > self.free_bits() {
            return Err(IpPoolError::business("requested size is too big"));
        }
        let key = normalize_key(key);
        let key = self.ensure_key_available(&key)?;

        let mark = self.trie.mark();
        match self.find_free(NodeId::ROOT, mask_bits) {
            Ok(Some(found)) => Ok(self.commit(found, key)),
            Ok(None) => {
                self.discard_since(mark);
                Err(IpPoolError::business("couldn't find a suitable CIDR block"))
            }
            Err(err) => {
                self.discard_since(mark);
                Err(err)
            }
        }
    }

    /// Block reserved under `key`, compared case-insensitively after trimming
    pub fn lookup(&self, key: &str) -> Option<Address> {
        let wanted = normalize_key(key);
        self.trie
            .reserved_nodes()
            .into_iter()
            .find(|id| {
                self.trie
                    .node(*id)
                    .owner_key
                    .as_deref()
                    .is_some_and(|owner| normalize_key(owner) == wanted)
            })
            .map(|id| self.address_of(id))
    }

    /// Every reservation as `(key, block)`, depth-first with the 0 branch first
    pub fn reservations(&self) -> Vec<(String, Address)> {
        self.trie
            .reserved_nodes()
            .into_iter()
            .filter_map(|id| {
                self.trie
                    .node(id)
                    .owner_key
                    .clone()
                    .map(|key| (key, self.address_of(id)))
            })
            .collect()
    }

    /// Indented rendering of every materialized node, for debugging
    pub fn debug_tree(&self) -> String {
        TreeRendering(self).to_string()
    }

    fn render_node(&self, id: NodeId, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.trie.node(id);
        write!(
            f,
            "{:indent$}bit: {}, reserved: {}, size: {}",
            "",
            node.bit,
            node.is_reserved(),
            node.mask_size,
            indent = depth * 2
        )?;
        if let Some(key) = &node.owner_key {
            write!(f, ", key: {key}, block: {}", self.address_of(id))?;
        }
        writeln!(f)?;
        for child in node.child_ids() {
            self.render_node(child, depth + 1, f)?;
        }
        Ok(())
    }

    // First-fit search. Recursion depth is bounded by the free bits of the pool.
    fn find_free(&mut self, id: NodeId, mask_bits: u8) -> Result<Option<NodeId>> {
        let node = self.trie.node(id);
        if node.is_reserved() {
            return Ok(None);
        }
        if node.mask_size == mask_bits {
            // a block of the right size is only free if nothing inside it is taken
            return Ok(match self.trie.first_reserved_in_subtree(id) {
                None => Some(id),
                Some(_) => None,
            });
        }
        if node.mask_size == 0 {
            return Ok(None);
        }

        let zero = self.trie.child_or_insert(id, 0)?;
        if let Some(found) = self.find_free(zero, mask_bits)? {
            return Ok(Some(found));
        }
        let one = self.trie.child_or_insert(id, 1)?;
        trace!("Searching 1-branch below {}", self.address_of(id));
        self.find_free(one, mask_bits)
    }

    fn commit(&mut self, id: NodeId, key: String) -> Address {
        let block = self.address_of(id);
        debug!("Reserved {} for key '{}' in pool {}", block, key, self.root);
        self.trie.reserve(id, key);
        block
    }

    fn discard_since(&mut self, mark: usize) {
        let removed = self.trie.rollback(mark);
        if removed > 0 {
            debug!("Rolled back {} trie nodes in pool {}", removed, self.root);
        }
    }

    fn ensure_key_available(&self, key: &str) -> Result<String> {
        let key = key.trim();
        if key.is_empty() {
            return Err(IpPoolError::business("key is required"));
        }
        let normalized = normalize_key(key);
        let in_use = self.trie.reserved_nodes().into_iter().any(|id| {
            self.trie
                .node(id)
                .owner_key
                .as_deref()
                .is_some_and(|owner| normalize_key(owner) == normalized)
        });
        if in_use {
            return Err(IpPoolError::business(format!(
                "the key {normalized} is already in use"
            )));
        }
        Ok(key.to_string())
    }

    /// Block covered by `id`: the branch bits below the root, aligned under the pool
    /// prefix and merged with the pool address.
    fn address_of(&self, id: NodeId) -> Address {
        let depth = self.trie.depth(id);
        let offset = self
            .trie
            .path_bits(id)
            .checked_shl(u32::from(self.free_bits() - depth))
            .unwrap_or(0);
        Address::block(
            self.root.value() | offset,
            ADDRESS_BITS - self.trie.node(id).mask_size,
        )
    }
}

struct TreeRendering<'a>(&'a CidrAllocator);

impl fmt::Display for TreeRendering<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render_node(NodeId::ROOT, 0, f)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
