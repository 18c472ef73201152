//! Catalog error taxonomy.
//!
//! # Invariants
//! - `NotFound` is the only condition callers are expected to handle.
//! - `InvalidDescriptor` signals a programming error in the descriptor source.
//! - The catalog never logs the errors it returns.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Lookup and instantiation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No descriptor matched the requested key, namespace or capability.
    NotFound(String),
    /// Descriptor shape cannot produce a value of its declared type.
    InvalidDescriptor { name: String, reason: String },
}

impl CatalogError {
    pub(crate) fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "type not found: {key}"),
            Self::InvalidDescriptor { name, reason } => {
                write!(f, "invalid type descriptor `{name}`: {reason}")
            }
        }
    }
}

impl Error for CatalogError {}
