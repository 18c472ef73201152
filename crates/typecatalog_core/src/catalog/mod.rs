//! Runtime type catalog.
//!
//! # Responsibility
//! - Describe discoverable types and index them by name and namespace.
//! - Filter descriptors by capability contract.
//! - Instantiate types from descriptors alone.
//!
//! # Invariants
//! - Registration is the only mutation; every other operation reads a
//!   snapshot of the indices.

pub mod bootstrap;
pub mod capability;
pub mod descriptor;
pub mod instance;
pub mod registry;
