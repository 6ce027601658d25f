//! Cloud provider trait definition

use crate::action::{ApplyResult, Plan};
use crate::data::{Attributes, Timeouts};
use crate::diff::DriftReport;
use crate::error::Result;
use crate::state::GlobalState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Cloud provider abstraction trait
///
/// A provider owns an API client and the resource controllers for the
/// resource types it supports, and drives them against the state store.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "linode")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Check desired resources against the resource schemas
    fn validate(&self, desired: &ResourceSet) -> Result<()>;

    /// Re-read every tracked resource and report drift
    async fn refresh(&self, state: &mut GlobalState) -> Result<Vec<DriftReport>>;

    /// Calculate the diff between desired and current state
    async fn plan(&self, desired: &ResourceSet, state: &GlobalState) -> Result<Plan>;

    /// Apply the planned actions, recording results in `state`
    async fn apply(&self, plan: &Plan, state: &mut GlobalState) -> Result<ApplyResult>;

    /// Bring an existing remote resource under management by its raw ID
    async fn import(
        &self,
        resource_type: &str,
        name: &str,
        id: &str,
        state: &mut GlobalState,
    ) -> Result<()>;

    /// Destroy a specific resource by state key
    async fn destroy(&self, key: &str, state: &mut GlobalState) -> Result<()>;

    /// Destroy all resources managed by this provider
    async fn destroy_all(&self, state: &mut GlobalState) -> Result<ApplyResult>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Set of resources to be managed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Resources indexed by type and name
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceConfig) {
        self.resources.insert(resource.key(), resource);
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<&ResourceConfig> {
        self.resources.get(&resource_key(resource_type, id))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }
}

/// Key of a resource inside a [`ResourceSet`] (`type:name`)
pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}:{}", resource_type, name)
}

/// Configuration for a cloud resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "volume", "sshkey")
    pub resource_type: String,

    /// Resource name in the manifest
    pub id: String,

    /// Provider name
    pub provider: String,

    /// Resource-specific configuration
    pub config: serde_json::Value,

    /// Attributes whose value is the ID of another managed resource,
    /// mapped to that resource's key (`type:name`)
    #[serde(default)]
    pub references: HashMap<String, String>,

    /// Deadlines for blocking waits
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            provider: provider.into(),
            config,
            references: HashMap::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_reference(mut self, attribute: impl Into<String>, target: impl Into<String>) -> Self {
        self.references.insert(attribute.into(), target.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.id)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Configuration as an attribute bag
    pub fn attributes(&self) -> Attributes {
        match &self.config {
            serde_json::Value::Object(map) => {
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
            }
            _ => Attributes::new(),
        }
    }
}
