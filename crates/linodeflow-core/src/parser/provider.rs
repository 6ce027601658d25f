use super::first_string;
use crate::error::{ManifestError, Result};
use crate::model::ProviderBlock;
use kdl::KdlNode;

/// Parse a `provider` node
pub fn parse_provider(node: &KdlNode) -> Result<ProviderBlock> {
    let name = first_string(node)
        .ok_or_else(|| ManifestError::InvalidConfig("provider requires a name".to_string()))?
        .to_string();

    let mut provider = ProviderBlock {
        name,
        ..Default::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let value = first_string(child).map(str::to_string);
            match child.name().value() {
                "url" => provider.url = value,
                other => {
                    if let Some(value) = value {
                        provider.config.insert(other.to_string(), value);
                    }
                }
            }
        }
    }

    Ok(provider)
}
