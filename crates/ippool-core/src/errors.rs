//! Unified error system for the CIDR allocator
//!
//! Every fallible operation in this crate returns [`IpPoolError`]. Business errors carry a
//! stable, user-facing message; together with malformed address input they are the
//! failures a caller is expected to correct. Invariant violations and serialization
//! failures are unexpected and carry full diagnostic detail.

use serde::{Deserialize, Serialize};

/// Unified error type for all allocation operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum IpPoolError {
    /// Predictable rule violation (bad prefix, duplicate key, conflicting block, ...)
    #[error("{message}")]
    Business {
        /// Exact message shown to the user
        message: String,
    },

    /// Address text could not be parsed
    #[error("invalid address format '{input}': {reason}")]
    Format {
        /// The rejected text
        input: String,
        /// Which part of the grammar failed
        reason: String,
    },

    /// Raw construction with a prefix length outside `0..=32`
    #[error("prefix length {prefix} is out of range 0..=32")]
    PrefixOutOfRange {
        /// The rejected prefix length
        prefix: u32,
    },

    /// Internal consistency failure that the public contract should never expose
    #[error("invariant violated: {message}")]
    Invariant {
        /// Full diagnostic detail
        message: String,
    },

    /// Persisted state could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },
}

impl IpPoolError {
    /// Create a business error
    pub fn business(message: impl Into<String>) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// Create an address format error
    pub fn format(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the error is user-correctable: a rule violation or malformed address input
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::Business { .. } | Self::Format { .. } | Self::PrefixOutOfRange { .. }
        )
    }
}

/// Standard Result type for allocator operations
pub type Result<T> = std::result::Result<T, IpPoolError>;

impl From<serde_json::Error> for IpPoolError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
