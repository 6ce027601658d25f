use super::resource::ResourceDecl;
use crate::error::{ManifestError, Result};
use linodeflow_cloud::ResourceSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Provider used by resources that do not name one
pub const DEFAULT_PROVIDER: &str = "linode";

/// Provider settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderBlock {
    /// Provider name ("linode")
    pub name: String,

    /// API base URL override
    pub url: Option<String>,

    /// Additional provider-specific settings
    pub config: HashMap<String, String>,
}

/// A parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Project name
    pub name: String,

    pub providers: BTreeMap<String, ProviderBlock>,

    /// Resources in declaration order
    pub resources: Vec<ResourceDecl>,
}

impl Manifest {
    pub fn provider(&self, name: &str) -> Option<&ProviderBlock> {
        self.providers.get(name)
    }

    pub fn resource(&self, resource_type: &str, name: &str) -> Option<&ResourceDecl> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Check cross-resource consistency: unique keys, declared providers
    /// and references to declared resources.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.key()) {
                return Err(ManifestError::Duplicate(format!(
                    "{} '{}'",
                    resource.resource_type, resource.name
                )));
            }
            if resource.provider != DEFAULT_PROVIDER
                && !self.providers.contains_key(&resource.provider)
            {
                return Err(ManifestError::ProviderNotFound(resource.provider.clone()));
            }
        }

        for resource in &self.resources {
            for (attribute, target) in &resource.references {
                if target == &resource.key() {
                    return Err(ManifestError::InvalidReference {
                        resource: resource.key(),
                        attribute: attribute.clone(),
                        target: target.clone(),
                        reason: "a resource cannot reference itself".to_string(),
                    });
                }
                if !seen.contains(target) {
                    return Err(ManifestError::InvalidReference {
                        resource: resource.key(),
                        attribute: attribute.clone(),
                        target: target.clone(),
                        reason: "no such resource is declared".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Desired resources for the reconciler
    pub fn to_resource_set(&self) -> ResourceSet {
        let mut set = ResourceSet::new();
        for resource in &self.resources {
            set.add(resource.to_config());
        }
        set
    }
}
