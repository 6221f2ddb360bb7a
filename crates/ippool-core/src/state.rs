//! Persisted state documents
//!
//! Both documents are plain maps of canonical address strings, serialized as camelCase
//! JSON. Maps keep insertion order so saved files are stable, but nothing depends on
//! that order: equality compares entries regardless of position.

use crate::errors::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Snapshot of a single pool allocator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CidrState {
    /// Pool block, e.g. `10.0.0.0/8`
    pub pool: String,
    /// Reservation key → reserved block
    #[serde(default, deserialize_with = "null_as_default")]
    pub reserved: IndexMap<String, String>,
}

/// Snapshot of a three-level address environment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentState {
    /// Address space the virtual networks are carved from
    pub address_space: String,
    /// Virtual network key → virtual network
    #[serde(default, deserialize_with = "null_as_default")]
    pub virtual_networks: IndexMap<String, VirtualNetworkState>,
}

/// Persisted virtual network
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkState {
    /// Block reserved for the virtual network
    pub address_space: String,
    /// Subnet key → subnet
    #[serde(default, deserialize_with = "null_as_default")]
    pub subnets: IndexMap<String, SubnetState>,
}

/// Persisted subnet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetState {
    /// Block reserved for the subnet
    pub address_space: String,
}

impl CidrState {
    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl EnvironmentState {
    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
