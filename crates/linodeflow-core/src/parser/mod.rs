//! KDL manifest parser
//!
//! Parses `linode.kdl` manifests. Node parsing for providers and resources
//! lives in submodules.

mod provider;
mod resource;

use provider::parse_provider;
use resource::parse_resource;

use crate::error::{ManifestError, Result};
use crate::model::{Manifest, RESOURCE_TYPES};
use kdl::{KdlDocument, KdlNode};
use std::fs;
use std::path::Path;

/// First positional string argument of a node
fn first_string(node: &KdlNode) -> Option<&str> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
}

/// Parse a manifest file. The project name defaults to the name of the
/// directory holding the file.
pub fn parse_manifest_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ManifestError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();

    tracing::debug!("Parsing manifest {}", path.display());
    parse_manifest_str(&content, name)
}

/// Parse manifest source
pub fn parse_manifest_str(content: &str, default_name: String) -> Result<Manifest> {
    let doc: KdlDocument = content.parse()?;

    let mut manifest = Manifest {
        name: default_name,
        ..Default::default()
    };

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                if let Some(project_name) = first_string(node) {
                    manifest.name = project_name.to_string();
                }
            }
            "provider" => {
                let provider = parse_provider(node)?;
                if manifest.providers.contains_key(&provider.name) {
                    return Err(ManifestError::Duplicate(format!("provider '{}'", provider.name)));
                }
                manifest.providers.insert(provider.name.clone(), provider);
            }
            kind if RESOURCE_TYPES.contains(&kind) => {
                manifest.resources.push(parse_resource(node)?);
            }
            other => return Err(ManifestError::UnknownNode(other.to_string())),
        }
    }

    manifest.validate()?;
    tracing::debug!(
        "Parsed manifest '{}' with {} resource(s)",
        manifest.name,
        manifest.resources.len()
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests;
