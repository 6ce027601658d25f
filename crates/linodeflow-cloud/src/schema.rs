//! Resource schema declarations
//!
//! A [`Schema`] lists the attributes of a resource type together with the
//! flags the reconciler needs: whether the user must, may or cannot set a
//! field, and whether changing it forces destroy-and-recreate.

use crate::data::Attributes;
use crate::error::{CloudError, Result};
use crate::provider::ResourceConfig;
use serde_json::Value;

/// Value kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    List,
}

impl FieldKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Int => value.is_i64() || value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::List => value.is_array(),
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int => write!(f, "integer"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::List => write!(f, "list"),
        }
    }
}

/// Who owns the value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    /// Must be set in the configuration
    Required,
    /// May be set in the configuration
    Optional,
    /// Set by the remote API only
    Computed,
    /// May be set; the remote API fills it in otherwise
    OptionalComputed,
}

/// A single schema field
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub mode: FieldMode,
    pub force_new: bool,
    pub sensitive: bool,
    pub description: &'static str,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind, mode: FieldMode) -> Self {
        Self {
            name,
            kind,
            mode,
            force_new: false,
            sensitive: false,
            description: "",
        }
    }

    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, FieldMode::Required)
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, FieldMode::Optional)
    }

    pub fn computed(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, FieldMode::Computed)
    }

    pub fn optional_computed(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, kind, FieldMode::OptionalComputed)
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Whether the configuration is allowed to set this field
    pub fn is_configurable(&self) -> bool {
        self.mode != FieldMode::Computed
    }

    /// Whether an unset configuration value means "keep whatever the API chose"
    pub fn is_computed(&self) -> bool {
        matches!(self.mode, FieldMode::Computed | FieldMode::OptionalComputed)
    }
}

/// Schema of one resource type
#[derive(Debug, Clone)]
pub struct Schema {
    resource_type: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(resource_type: &'static str, fields: Vec<Field>) -> Self {
        Self {
            resource_type,
            fields,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Fields the configuration may set
    pub fn configurable(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_configurable())
    }

    /// Check a desired configuration against the schema.
    ///
    /// Attributes supplied through a reference count as present; their
    /// value is only known once the referenced resource exists.
    pub fn validate(&self, config: &ResourceConfig) -> Result<()> {
        let attributes = config.attributes();
        let mut problems = Vec::new();

        for (name, value) in &attributes {
            match self.field(name) {
                None => problems.push(format!("unknown attribute '{}'", name)),
                Some(field) if !field.is_configurable() => {
                    problems.push(format!("attribute '{}' is computed and cannot be set", name))
                }
                Some(field) if !value.is_null() && !field.kind.accepts(value) => problems.push(
                    format!("attribute '{}' must be of type {}", name, field.kind),
                ),
                Some(_) => {}
            }
        }

        for (name, target) in &config.references {
            match self.field(name) {
                Some(field) if field.is_configurable() && field.kind == FieldKind::Int => {}
                Some(_) => problems.push(format!(
                    "attribute '{}' cannot reference '{}'",
                    name, target
                )),
                None => problems.push(format!("unknown attribute '{}'", name)),
            }
        }

        for field in self.fields.iter().filter(|f| f.mode == FieldMode::Required) {
            let present = attributes.get(field.name).is_some_and(|v| !v.is_null())
                || config.references.contains_key(field.name);
            if !present {
                problems.push(format!("missing required attribute '{}'", field.name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            problems.sort();
            Err(CloudError::InvalidConfig(format!(
                "{} '{}': {}",
                self.resource_type,
                config.id,
                problems.join(", ")
            )))
        }
    }

    /// Names of configurable fields whose desired value differs from the
    /// last-known one. Unset optional+computed fields are skipped; an unset
    /// optional field compares equal to its zero value.
    pub fn changed_fields(&self, state: &Attributes, desired: &Attributes) -> Vec<&'static str> {
        self.configurable()
            .filter(|field| {
                let want = desired.get(field.name).unwrap_or(&Value::Null);
                if want.is_null() && field.is_computed() {
                    return false;
                }
                let have = state.get(field.name).unwrap_or(&Value::Null);
                !crate::diff::values_equal(field.kind, have, want)
            })
            .map(|field| field.name)
            .collect()
    }

    /// Whether any of the given fields forces replacement
    pub fn requires_replace(&self, changed: &[&str]) -> bool {
        changed
            .iter()
            .filter_map(|name| self.field(name))
            .any(|field| field.force_new)
    }
}
