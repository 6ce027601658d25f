//! linodeflow manifest model and parser
//!
//! Reads `linode.kdl` manifests into a [`Manifest`] and converts the
//! declared resources into the [`linodeflow_cloud::ResourceSet`] the
//! reconciler plans against.

pub mod error;
pub mod model;
pub mod parser;

pub use error::{ManifestError, Result};
pub use model::{DEFAULT_PROVIDER, Manifest, ProviderBlock, RESOURCE_TYPES, ResourceDecl};
pub use parser::{parse_manifest_file, parse_manifest_str};
