use linodeflow_cloud::{ResourceConfig, Timeouts, resource_key};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Node names that declare a resource
pub const RESOURCE_TYPES: [&str; 4] = ["sshkey", "instance", "volume", "image"];

/// One declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// Resource type (node name)
    pub resource_type: String,

    /// Resource name (first argument of the node)
    pub name: String,

    /// Provider owning the resource
    pub provider: String,

    /// Literal attribute values
    pub attributes: Map<String, Value>,

    /// Attributes taking the ID of another declared resource, mapped to
    /// that resource's key (`type:name`)
    pub references: BTreeMap<String, String>,

    pub timeouts: Timeouts,
}

impl ResourceDecl {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            attributes: Map::new(),
            references: BTreeMap::new(),
            timeouts: Timeouts::default(),
        }
    }

    /// Key of the resource (`type:name`)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Desired configuration handed to the reconciler
    pub fn to_config(&self) -> ResourceConfig {
        let mut config = ResourceConfig::new(
            &self.resource_type,
            &self.name,
            &self.provider,
            Value::Object(self.attributes.clone()),
        )
        .with_timeouts(self.timeouts);
        for (attribute, target) in &self.references {
            config = config.with_reference(attribute, target);
        }
        config
    }
}
