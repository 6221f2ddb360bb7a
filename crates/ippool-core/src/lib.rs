//! # ippool-core - hierarchical CIDR allocation
//!
//! Hands out non-overlapping blocks of a 32-bit address space and records every
//! reservation under a unique key.
//!
//! ## Core Concepts
//!
//! - **Address**: 32-bit value with an optional prefix length, canonical by construction
//! - **CidrAllocator**: binary trie over one pool; exact-block and first-fit reservation
//! - **AddressEnvironment**: address space → named virtual networks → named subnets
//! - **State**: flat, serializable snapshots that rebuild an identical allocator
//!
//! ## What's NOT in this crate
//!
//! - File I/O and command-line handling (belong in `ippool-cli`)
//! - Concurrent access: an allocator is a plain value owned by one caller at a time

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Address value type and parsing
pub mod address;

/// Trie allocation engine
pub mod allocator;

/// Virtual network / subnet composition
pub mod environment;

/// Unified error type
pub mod errors;

/// Persisted state documents
pub mod state;

/// Arena-backed binary trie
pub mod trie;

pub use address::{Address, ADDRESS_BITS};
pub use allocator::{BlockRequest, CidrAllocator};
pub use environment::{AddressEnvironment, Subnet, VirtualNetwork};
pub use errors::{IpPoolError, Result};
pub use state::{CidrState, EnvironmentState, SubnetState, VirtualNetworkState};
pub use trie::{NodeId, Trie, TrieNode};
