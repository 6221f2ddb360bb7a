//! Loading and saving state files
//!
//! A state file holds either a pool document (`pool` + `reserved`) or an environment
//! document (`addressSpace` + `virtualNetworks`). Each command asks for the kind it
//! operates on and gets a business error when the file holds the other one.

use anyhow::Context;
use ippool_core::{AddressEnvironment, CidrAllocator, CidrState, EnvironmentState, IpPoolError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Which document a state file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Pool,
    Environment,
}

impl StateKind {
    fn marker_field(self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Environment => "addressSpace",
        }
    }

    /// Kind of a parsed document, if it is either
    pub fn detect(document: &serde_json::Value) -> Option<Self> {
        [Self::Pool, Self::Environment]
            .into_iter()
            .find(|kind| document.get(kind.marker_field()).is_some())
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool => write!(f, "pool"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// Parsed contents of a state file of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDocument {
    Pool(CidrState),
    Environment(EnvironmentState),
}

/// Read a state file without committing to a kind
pub fn load_document(path: &Path) -> anyhow::Result<StateDocument> {
    let document = read_json(path)?;
    match StateKind::detect(&document) {
        Some(StateKind::Pool) => Ok(StateDocument::Pool(from_value(document)?)),
        Some(StateKind::Environment) => Ok(StateDocument::Environment(from_value(document)?)),
        None => Err(IpPoolError::business(format!(
            "state file {} does not contain pool or environment state",
            path.display()
        ))
        .into()),
    }
}

/// Rebuild the pool allocator stored in `path`
pub fn load_pool(path: &Path) -> anyhow::Result<CidrAllocator> {
    let state: CidrState = load_kind(path, StateKind::Pool)?;
    Ok(CidrAllocator::from_state(&state)?)
}

/// Rebuild the environment stored in `path`
pub fn load_environment(path: &Path) -> anyhow::Result<AddressEnvironment> {
    let state: EnvironmentState = load_kind(path, StateKind::Environment)?;
    Ok(AddressEnvironment::from_state(&state)?)
}

/// Persist a pool allocator
pub fn save_pool(path: &Path, allocator: &CidrAllocator) -> anyhow::Result<()> {
    write_json(path, &allocator.to_state())
}

/// Persist an environment
pub fn save_environment(path: &Path, env: &AddressEnvironment) -> anyhow::Result<()> {
    write_json(path, &env.to_state())
}

fn load_kind<T: DeserializeOwned>(path: &Path, kind: StateKind) -> anyhow::Result<T> {
    let document = read_json(path)?;
    if StateKind::detect(&document) != Some(kind) {
        return Err(IpPoolError::business(format!(
            "state file {} does not contain {kind} state",
            path.display()
        ))
        .into());
    }
    from_value(document)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    if !path.exists() {
        return Err(IpPoolError::business(format!(
            "state file {} doesn't exist",
            path.display()
        ))
        .into());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    let document = serde_json::from_str(&text)
        .map_err(IpPoolError::from)
        .with_context(|| format!("Failed to parse state file {}", path.display()))?;
    debug!("Loaded state file {}", path.display());
    Ok(document)
}

fn from_value<T: DeserializeOwned>(document: serde_json::Value) -> anyhow::Result<T> {
    Ok(serde_json::from_value(document).map_err(IpPoolError::from)?)
}

// Staged as `<path>.tmp`, then renamed over the target
fn write_json<T: Serialize>(path: &Path, state: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(state).map_err(IpPoolError::from)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    std::fs::write(&staging, text + "\n")
        .with_context(|| format!("Failed to write state file {}", path.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace state file {}", path.display()))?;
    debug!("Saved state file {}", path.display());
    Ok(())
}
