//! Generic reconciliation driver
//!
//! [`Reconciler`] owns a client handle and the resource controllers of one
//! provider. It turns a desired [`ResourceSet`] and the recorded
//! [`GlobalState`] into a [`Plan`], applies plans action by action, refreshes
//! recorded resources and imports existing ones.

use crate::action::{Action, ActionType, ApplyResult, Plan};
use crate::data::{Attributes, ResourceData};
use crate::diff::{DriftReport, detect_drift};
use crate::error::{CloudError, Result};
use crate::provider::{ResourceConfig, ResourceSet, resource_key};
use crate::resource::Resource;
use crate::state::{GlobalState, ResourceState, ResourceStatus, split_state_key, state_key};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

pub struct Reconciler<C: ?Sized + Sync> {
    provider: String,
    client: Arc<C>,
    controllers: BTreeMap<&'static str, Box<dyn Resource<C>>>,
}

impl<C: ?Sized + Send + Sync> Reconciler<C> {
    pub fn new(provider: impl Into<String>, client: Arc<C>) -> Self {
        Self {
            provider: provider.into(),
            client,
            controllers: BTreeMap::new(),
        }
    }

    /// Register the controller for one resource type
    pub fn register<R: Resource<C> + 'static>(mut self, controller: R) -> Self {
        self.controllers
            .insert(controller.resource_type(), Box::new(controller));
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.controllers.keys().copied()
    }

    pub fn controller(&self, resource_type: &str) -> Result<&dyn Resource<C>> {
        self.controllers
            .get(resource_type)
            .map(|c| c.as_ref())
            .ok_or_else(|| CloudError::UnsupportedResource(resource_type.to_string()))
    }

    fn rank_of(&self, resource_type: &str) -> u8 {
        self.controllers
            .get(resource_type)
            .map(|c| c.rank())
            .unwrap_or(u8::MAX)
    }

    fn state_key_for(&self, config: &ResourceConfig) -> String {
        state_key(&self.provider, &config.resource_type, &config.id)
    }

    fn owned<'a>(&self, desired: &'a ResourceSet) -> Vec<&'a ResourceConfig> {
        let mut configs: Vec<&ResourceConfig> = desired
            .iter()
            .filter(|c| c.provider == self.provider)
            .collect();
        configs.sort_by_key(|c| (self.rank_of(&c.resource_type), c.key()));
        configs
    }

    /// Check every desired resource against its schema and its references
    /// against the declared resources.
    pub fn validate(&self, desired: &ResourceSet) -> Result<()> {
        let mut problems = Vec::new();

        for config in self.owned(desired) {
            let controller = match self.controller(&config.resource_type) {
                Ok(controller) => controller,
                Err(e) => {
                    problems.push(e.to_string());
                    continue;
                }
            };

            if let Err(e) = controller.schema().validate(config) {
                problems.push(e.to_string());
            }

            for (attribute, target) in &config.references {
                match desired.resources.get(target) {
                    None => problems.push(format!(
                        "{}: attribute '{}' references undeclared resource '{}'",
                        config.key(),
                        attribute,
                        target
                    )),
                    Some(t) if self.rank_of(&t.resource_type) >= controller.rank() => {
                        problems.push(format!(
                            "{}: attribute '{}' cannot depend on '{}'",
                            config.key(),
                            attribute,
                            target
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CloudError::InvalidConfig(problems.join("\n")))
        }
    }

    /// Desired attributes with references replaced by the referenced
    /// resource's ID. Returns the attributes whose target is not recorded yet.
    fn resolve_references(
        &self,
        config: &ResourceConfig,
        state: &GlobalState,
    ) -> Result<(Attributes, Vec<String>)> {
        let mut attributes = config.attributes();
        let mut unresolved = Vec::new();

        for (attribute, target) in &config.references {
            let (resource_type, name) = target.split_once(':').ok_or_else(|| {
                CloudError::InvalidConfig(format!("invalid reference '{}'", target))
            })?;

            match state.get_resource(&state_key(&self.provider, resource_type, name)) {
                Some(recorded) => {
                    let id: i64 = recorded.id.parse().map_err(|e| {
                        CloudError::invalid_id(&recorded.resource_type, &recorded.id, e)
                    })?;
                    attributes.insert(attribute.clone(), serde_json::json!(id));
                }
                None => unresolved.push(attribute.clone()),
            }
        }

        unresolved.sort();
        Ok((attributes, unresolved))
    }

    fn action(
        &self,
        action_type: ActionType,
        resource_type: &str,
        name: &str,
        changed: Vec<String>,
        desired: Option<&ResourceConfig>,
    ) -> Action {
        let key = state_key(&self.provider, resource_type, name);
        let description = match action_type {
            ActionType::Create => format!("{} '{}' will be created", resource_type, name),
            ActionType::Update => format!(
                "{} '{}' will be updated in place ({})",
                resource_type,
                name,
                changed.join(", ")
            ),
            ActionType::Replace => format!(
                "{} '{}' must be replaced ({})",
                resource_type,
                name,
                changed.join(", ")
            ),
            ActionType::Delete => format!("{} '{}' will be deleted", resource_type, name),
            ActionType::NoOp => format!("{} '{}' is up to date", resource_type, name),
        };

        Action {
            id: format!("{}-{}", action_type, key),
            action_type,
            resource_type: resource_type.to_string(),
            resource_id: name.to_string(),
            state_key: key,
            description,
            changed,
            desired: desired.cloned(),
        }
    }

    /// Compute the actions that bring the recorded state to the desired one
    pub fn plan(&self, desired: &ResourceSet, state: &GlobalState) -> Result<Plan> {
        self.validate(desired)?;

        let mut actions = Vec::new();
        // Resources that get a new ID during this plan
        let mut recreated: HashSet<String> = HashSet::new();

        for config in self.owned(desired) {
            let controller = self.controller(&config.resource_type)?;
            let schema = controller.schema();
            let (attributes, unresolved) = self.resolve_references(config, state)?;

            let pending: Vec<String> = config
                .references
                .iter()
                .filter(|&(attribute, target)| {
                    unresolved.contains(attribute) || recreated.contains(target.as_str())
                })
                .map(|(attribute, _)| attribute.clone())
                .collect();

            let action = match state.get_resource(&self.state_key_for(config)) {
                None => {
                    recreated.insert(config.key());
                    self.action(
                        ActionType::Create,
                        &config.resource_type,
                        &config.id,
                        Vec::new(),
                        Some(config),
                    )
                }
                Some(recorded) => {
                    let mut changed: Vec<String> = schema
                        .changed_fields(&recorded.attributes, &attributes)
                        .into_iter()
                        .map(String::from)
                        .collect();
                    for attribute in pending {
                        if !changed.contains(&attribute) {
                            changed.push(attribute);
                        }
                    }
                    changed.sort();

                    let names: Vec<&str> = changed.iter().map(String::as_str).collect();
                    let action_type = if changed.is_empty() {
                        ActionType::NoOp
                    } else if schema.requires_replace(&names) {
                        recreated.insert(config.key());
                        ActionType::Replace
                    } else {
                        ActionType::Update
                    };
                    self.action(
                        action_type,
                        &config.resource_type,
                        &config.id,
                        changed,
                        Some(config),
                    )
                }
            };
            actions.push(action);
        }

        let mut orphans: Vec<(&str, &str)> = state
            .get_provider_resources(&self.provider)
            .into_iter()
            .filter_map(|(key, _)| split_state_key(key))
            .filter(|(_, resource_type, name)| {
                !desired.contains(&resource_key(resource_type, name))
            })
            .map(|(_, resource_type, name)| (resource_type, name))
            .collect();
        orphans.sort_by_key(|(resource_type, name)| {
            (Reverse(self.rank_of(resource_type)), *name)
        });

        for (resource_type, name) in orphans {
            actions.push(self.action(ActionType::Delete, resource_type, name, Vec::new(), None));
        }

        Ok(Plan::new(actions))
    }

    /// Execute a plan. Each action's outcome is recorded in `state` as soon
    /// as it completes; a failed action does not stop unrelated ones.
    pub async fn apply(&self, plan: &Plan, state: &mut GlobalState) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            let outcome = match action.action_type {
                ActionType::NoOp => continue,
                ActionType::Create => self.apply_create(action, state).await,
                ActionType::Update => self.apply_update(action, state).await,
                ActionType::Replace => match self.apply_delete(action, state).await {
                    Ok(_) => self.apply_create(action, state).await,
                    Err(e) => Err(e),
                },
                ActionType::Delete => self.apply_delete(action, state).await,
            };

            match &outcome {
                Ok(message) => tracing::info!("{}", message),
                Err(e) => tracing::warn!("{} failed: {}", action.id, e),
            }
            result.record(&action.id, &outcome);
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    fn desired_of<'a>(&self, action: &'a Action) -> Result<&'a ResourceConfig> {
        action.desired.as_ref().ok_or_else(|| {
            CloudError::InvalidConfig(format!("{} has no desired configuration", action.id))
        })
    }

    fn resolved_attributes(
        &self,
        config: &ResourceConfig,
        state: &GlobalState,
    ) -> Result<Attributes> {
        let (attributes, unresolved) = self.resolve_references(config, state)?;
        if let Some(attribute) = unresolved.first() {
            return Err(CloudError::InvalidConfig(format!(
                "{}: '{}' references {} which does not exist",
                config.key(),
                attribute,
                config.references[attribute]
            )));
        }
        Ok(attributes)
    }

    async fn apply_create(&self, action: &Action, state: &mut GlobalState) -> Result<String> {
        let config = self.desired_of(action)?;
        let controller = self.controller(&config.resource_type)?;
        let attributes = self.resolved_attributes(config, state)?;
        let key = &action.state_key;

        let mut data = ResourceData::from_config(&config.resource_type, attributes)
            .with_timeouts(config.timeouts);

        tracing::info!("{}: {} -> {}", key, ResourceStatus::Absent, ResourceStatus::Creating);
        if let Err(e) = controller.create(&*self.client, &mut data).await {
            tracing::info!("{}: {} -> {}", key, ResourceStatus::Creating, ResourceStatus::Absent);
            return Err(e);
        }
        if !data.has_id() {
            return Err(CloudError::CreationFailed(format!(
                "{} was not confirmed after creation",
                key
            )));
        }

        state.set_resource(key.clone(), ResourceState::from_data(&data));
        tracing::info!("{}: {} -> {}", key, ResourceStatus::Creating, ResourceStatus::Exists);
        Ok(format!("Created {} (ID: {})", key, data.id()))
    }

    async fn apply_update(&self, action: &Action, state: &mut GlobalState) -> Result<String> {
        let config = self.desired_of(action)?;
        let controller = self.controller(&config.resource_type)?;
        let attributes = self.resolved_attributes(config, state)?;
        let key = &action.state_key;

        let recorded = state
            .get_resource_mut(key)
            .ok_or_else(|| CloudError::ResourceNotFound(key.clone()))?;
        let mut data = recorded
            .to_data()
            .with_config(attributes)
            .with_timeouts(config.timeouts);
        recorded.status = ResourceStatus::Updating;

        tracing::info!("{}: {} -> {}", key, ResourceStatus::Exists, ResourceStatus::Updating);
        let outcome = controller.update(&*self.client, &mut data).await;

        match outcome {
            Ok(()) if data.has_id() => {
                if let Some(recorded) = state.get_resource_mut(key) {
                    recorded.update_from(&data);
                }
                tracing::info!("{}: {} -> {}", key, ResourceStatus::Updating, ResourceStatus::Exists);
                Ok(format!("Updated {} ({})", key, action.changed.join(", ")))
            }
            Ok(()) => {
                tracing::warn!("{} no longer exists, removing it from state", key);
                state.remove_resource(key);
                Err(CloudError::ResourceNotFound(format!("{} vanished during update", key)))
            }
            Err(e) => {
                if let Some(recorded) = state.get_resource_mut(key) {
                    recorded.status = ResourceStatus::Exists;
                }
                Err(e)
            }
        }
    }

    async fn apply_delete(&self, action: &Action, state: &mut GlobalState) -> Result<String> {
        let key = &action.state_key;
        let Some(recorded) = state.get_resource_mut(key) else {
            return Ok(format!("{} is already absent", key));
        };
        let controller = self.controller(&recorded.resource_type)?;

        let mut data = recorded.to_data();
        if let Some(config) = &action.desired {
            data = data.with_timeouts(config.timeouts);
        }
        recorded.status = ResourceStatus::Deleting;

        tracing::info!("{}: {} -> {}", key, ResourceStatus::Exists, ResourceStatus::Deleting);
        if let Err(e) = controller.delete(&*self.client, &mut data).await {
            if let Some(recorded) = state.get_resource_mut(key) {
                recorded.status = ResourceStatus::Exists;
            }
            return Err(e);
        }

        state.remove_resource(key);
        tracing::info!("{}: {} -> {}", key, ResourceStatus::Deleting, ResourceStatus::Absent);
        Ok(format!("Deleted {}", key))
    }

    /// Re-read every recorded resource of this provider. Resources that no
    /// longer exist are dropped from the state. Only resources that drifted
    /// or vanished are reported.
    pub async fn refresh(&self, state: &mut GlobalState) -> Result<Vec<DriftReport>> {
        let keys: Vec<String> = state
            .get_provider_resources(&self.provider)
            .into_iter()
            .map(|(key, _)| key.clone())
            .collect();

        let mut reports = Vec::new();
        for key in keys {
            let Some(recorded) = state.get_resource(&key) else {
                continue;
            };
            let controller = match self.controller(&recorded.resource_type) {
                Ok(controller) => controller,
                Err(_) => {
                    tracing::warn!(
                        "Skipping {}: unsupported resource type {}",
                        key,
                        recorded.resource_type
                    );
                    continue;
                }
            };

            let before = recorded.attributes.clone();
            let mut data = recorded.to_data();
            controller.read(&*self.client, &mut data).await?;

            if !data.has_id() {
                tracing::warn!("Removing {} from state because it no longer exists", key);
                state.remove_resource(&key);
                reports.push(DriftReport::vanished(key));
                continue;
            }

            let report = detect_drift(key.clone(), &before, data.state());
            if let Some(recorded) = state.get_resource_mut(&key) {
                recorded.update_from(&data);
            }
            if report.has_drift {
                reports.push(report);
            }
        }

        Ok(reports)
    }

    /// Passthrough import of an existing remote resource
    pub async fn import(
        &self,
        resource_type: &str,
        name: &str,
        id: &str,
        state: &mut GlobalState,
    ) -> Result<()> {
        let key = state_key(&self.provider, resource_type, name);
        if state.get_resource(&key).is_some() {
            return Err(CloudError::InvalidConfig(format!("{} is already managed", key)));
        }

        let controller = self.controller(resource_type)?;
        let data = controller.import(&*self.client, id).await?;
        state.set_resource(key.clone(), ResourceState::from_data(&data));
        tracing::info!("Imported {} (ID: {})", key, data.id());
        Ok(())
    }

    /// Delete one recorded resource
    pub async fn destroy(&self, key: &str, state: &mut GlobalState) -> Result<()> {
        let (_, resource_type, name) = split_state_key(key)
            .ok_or_else(|| CloudError::InvalidConfig(format!("invalid state key '{}'", key)))?;
        if state.get_resource(key).is_none() {
            return Err(CloudError::ResourceNotFound(key.to_string()));
        }

        let action = self.action(ActionType::Delete, resource_type, name, Vec::new(), None);
        self.apply_delete(&action, state).await?;
        Ok(())
    }

    /// Delete every recorded resource of this provider, dependents first
    pub async fn destroy_all(&self, state: &mut GlobalState) -> Result<ApplyResult> {
        let mut targets: Vec<(String, String)> = state
            .get_provider_resources(&self.provider)
            .into_iter()
            .filter_map(|(key, _)| split_state_key(key))
            .map(|(_, resource_type, name)| (resource_type.to_string(), name.to_string()))
            .collect();
        targets.sort_by_key(|(resource_type, name)| {
            (Reverse(self.rank_of(resource_type)), name.clone())
        });

        let actions = targets
            .iter()
            .map(|(resource_type, name)| {
                self.action(ActionType::Delete, resource_type, name, Vec::new(), None)
            })
            .collect();
        self.apply(&Plan::new(actions), state).await
    }
}
