//! In-memory attribute bag of a single resource instance
//!
//! [`ResourceData`] pairs the desired configuration of a resource with its
//! last-known remote attributes. Controllers read the desired values through
//! the typed getters and write what the API reports with [`ResourceData::set`].

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Attribute name to value
pub type Attributes = HashMap<String, Value>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Lifecycle operation a timeout applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Per-operation deadlines for blocking waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

impl Timeouts {
    pub fn get(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    pub fn set(&mut self, operation: Operation, timeout: Duration) {
        match operation {
            Operation::Create => self.create = timeout,
            Operation::Update => self.update = timeout,
            Operation::Delete => self.delete = timeout,
        }
    }
}

/// Desired configuration and last-known state of one resource instance
#[derive(Debug, Clone)]
pub struct ResourceData {
    resource_type: String,
    id: String,
    state: Attributes,
    config: Attributes,
    timeouts: Timeouts,
}

impl ResourceData {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: String::new(),
            state: Attributes::new(),
            config: Attributes::new(),
            timeouts: Timeouts::default(),
        }
    }

    /// Data for a resource that does not exist yet
    pub fn from_config(resource_type: impl Into<String>, config: Attributes) -> Self {
        Self::new(resource_type).with_config(config)
    }

    /// Data for a resource already tracked in the state store
    pub fn from_state(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        state: Attributes,
    ) -> Self {
        let mut data = Self::new(resource_type);
        data.id = id.into();
        data.state = state;
        data
    }

    pub fn with_config(mut self, config: Attributes) -> Self {
        self.config = config;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Remote ID; empty when the resource is absent
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// Parse the ID as the numeric identifier most Linode entities use
    pub fn numeric_id(&self) -> Result<i64> {
        self.id
            .parse::<i64>()
            .map_err(|e| CloudError::invalid_id(&self.resource_type, &self.id, e))
    }

    pub fn timeout(&self, operation: Operation) -> Duration {
        self.timeouts.get(operation)
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Desired value if configured, otherwise the last-known value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config
            .get(key)
            .filter(|v| !v.is_null())
            .or_else(|| self.state.get(key).filter(|v| !v.is_null()))
    }

    /// Desired value only
    pub fn get_config(&self, key: &str) -> Option<&Value> {
        self.config.get(key).filter(|v| !v.is_null())
    }

    /// Last-known value only
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.state.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| self.missing(key))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64> {
        self.get_i64(key).ok_or_else(|| self.missing(key))
    }

    fn missing(&self, key: &str) -> CloudError {
        CloudError::InvalidConfig(format!(
            "{} requires an attribute '{}'",
            self.resource_type, key
        ))
    }

    /// Record a value reported by the remote API
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.insert(key.into(), value.into());
    }

    /// Record a value only when the remote API reported one
    pub fn set_opt<T: Into<Value>>(&mut self, key: impl Into<String>, value: Option<T>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    /// Whether the desired value differs from the last-known one.
    ///
    /// A missing value on either side compares equal to a zero value
    /// (`0`, `""`, `false`, `[]`) on the other.
    pub fn has_change(&self, key: &str) -> bool {
        let want = self.config.get(key).unwrap_or(&Value::Null);
        let have = self.state.get(key).unwrap_or(&Value::Null);
        if is_zero(want) && is_zero(have) {
            return false;
        }
        want != have
    }

    pub fn state(&self) -> &Attributes {
        &self.state
    }

    pub fn config(&self) -> &Attributes {
        &self.config
    }

    pub fn into_state(self) -> Attributes {
        self.state
    }
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
