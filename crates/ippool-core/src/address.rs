//! 32-bit addresses with an optional prefix length
//!
//! An [`Address`] is either a plain host address (`10.1.2.3`) or a CIDR block
//! (`10.1.0.0/16`). Blocks are canonical: the bits beyond the prefix length are cleared
//! when the value is built, so every block has exactly one textual form.

use crate::errors::{IpPoolError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Number of bits in an address
pub const ADDRESS_BITS: u8 = 32;

/// Mask with the leading `prefix` bits set.
pub(crate) fn network_mask(prefix: u8) -> u32 {
    u32::MAX
        .checked_shl(u32::from(ADDRESS_BITS.saturating_sub(prefix)))
        .unwrap_or(0)
}

/// Immutable 32-bit address, optionally carrying a prefix length.
///
/// Equality, ordering and hashing look at the numeric value only; the prefix length only
/// changes the canonical string form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    value: u32,
    prefix_len: Option<u8>,
}

impl Address {
    /// Plain host address without a prefix length
    pub const fn host(value: u32) -> Self {
        Self {
            value,
            prefix_len: None,
        }
    }

    /// Block address; host bits beyond `prefix_len` are cleared.
    pub fn with_prefix(value: u32, prefix_len: u32) -> Result<Self> {
        let prefix = u8::try_from(prefix_len)
            .ok()
            .filter(|p| *p <= ADDRESS_BITS)
            .ok_or(IpPoolError::PrefixOutOfRange { prefix: prefix_len })?;
        Ok(Self {
            value: value & network_mask(prefix),
            prefix_len: Some(prefix),
        })
    }

    /// Block built from trie arithmetic, where the prefix is known to be in range.
    pub(crate) fn block(value: u32, prefix_len: u8) -> Self {
        let prefix = prefix_len.min(ADDRESS_BITS);
        Self {
            value: value & network_mask(prefix),
            prefix_len: Some(prefix),
        }
    }

    /// Numeric value, most significant octet first
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Number of fixed leading bits, if this is a block
    pub const fn prefix_len(&self) -> Option<u8> {
        self.prefix_len
    }

    /// Number of free bits below the prefix, if this is a block
    pub fn host_bits(&self) -> Option<u8> {
        self.prefix_len.map(|p| ADDRESS_BITS - p)
    }

    /// Whether `other` lies inside this block. Plain addresses only contain themselves.
    pub fn contains(&self, other: &Address) -> bool {
        match self.prefix_len {
            Some(prefix) => {
                let other_prefix = other.prefix_len.unwrap_or(ADDRESS_BITS);
                other_prefix >= prefix
                    && other.value & network_mask(prefix) == self.value & network_mask(prefix)
            }
            None => self.value == other.value,
        }
    }

    /// The dotted-quad part of the address
    pub fn ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.value)
    }
}

impl From<Ipv4Addr> for Address {
    fn from(ip: Ipv4Addr) -> Self {
        Self::host(u32::from(ip))
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Address {}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.value.to_be_bytes();
        write!(f, "{a}.{b}.{c}.{d}")?;
        if let Some(prefix) = self.prefix_len {
            write!(f, "/{prefix}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = IpPoolError;

    fn from_str(text: &str) -> Result<Self> {
        let (body, prefix) = match text.split_once('/') {
            Some((body, prefix)) => (body, Some(parse_prefix(text, prefix)?)),
            None => (text, None),
        };

        let body = body.trim();
        if body.is_empty() {
            return Err(IpPoolError::format(text, "address is empty"));
        }

        let octets: Vec<&str> = body.split('.').collect();
        if octets.len() != 4 {
            return Err(IpPoolError::format(
                text,
                format!("expected 4 octets, found {}", octets.len()),
            ));
        }

        let mut value = 0u32;
        for octet in octets {
            let byte: u8 = octet.trim().parse().map_err(|_| {
                IpPoolError::format(text, format!("octet '{octet}' is not a number in 0..=255"))
            })?;
            value = (value << 8) | u32::from(byte);
        }

        match prefix {
            Some(prefix) => Self::with_prefix(value, u32::from(prefix)),
            None => Ok(Self::host(value)),
        }
    }
}

fn parse_prefix(text: &str, prefix: &str) -> Result<u8> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(IpPoolError::format(text, "prefix length is empty"));
    }
    let parsed: u8 = prefix
        .parse()
        .map_err(|_| IpPoolError::format(text, format!("prefix length '{prefix}' is not a number")))?;
    if parsed > ADDRESS_BITS {
        return Err(IpPoolError::format(
            text,
            format!("prefix length {parsed} is out of range 0..=32"),
        ));
    }
    Ok(parsed)
}

impl TryFrom<String> for Address {
    type Error = IpPoolError;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
