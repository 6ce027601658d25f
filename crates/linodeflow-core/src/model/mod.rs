//! Manifest model
//!
//! In-memory form of a `linode.kdl` manifest: the project, provider
//! settings and declared resources.

mod manifest;
mod resource;

pub use manifest::{DEFAULT_PROVIDER, Manifest, ProviderBlock};
pub use resource::{RESOURCE_TYPES, ResourceDecl};
