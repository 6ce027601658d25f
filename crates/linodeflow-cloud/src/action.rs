//! Plans and the outcome of applying them

use crate::error::Result;
use crate::provider::ResourceConfig;
use serde::{Deserialize, Serialize};

/// One step of a plan, addressed by the resource's state key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// `{action_type}-{state_key}`
    pub id: String,
    pub action_type: ActionType,
    pub resource_type: String,
    /// Name of the resource in the manifest
    pub resource_id: String,
    /// `provider:type:name`
    pub state_key: String,
    pub description: String,
    /// Attributes whose desired value differs from the recorded one
    #[serde(default)]
    pub changed: Vec<String>,
    /// Configuration to converge to; `None` for deletions
    pub desired: Option<ResourceConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    /// Delete then create; a force-new attribute changed
    Replace,
    Delete,
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// What happened to one action. `message` holds the error text for
/// failed actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub action_id: String,
    pub message: String,
}

/// Outcome of `apply`: every executed action lands in exactly one list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,
    pub failed: Vec<ActionResult>,
    pub duration_ms: u64,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record(&mut self, action_id: &str, outcome: &Result<String>) {
        let (list, message) = match outcome {
            Ok(message) => (&mut self.succeeded, message.clone()),
            Err(e) => (&mut self.failed, e.to_string()),
        };
        list.push(ActionResult {
            action_id: action_id.to_string(),
            message,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Creates and updates by ascending rank, then deletes by descending rank
    pub actions: Vec<Action>,
    /// False when every action is a no-op
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn action_for(&self, state_key: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.state_key == state_key)
    }

    pub fn summary(&self) -> PlanSummary {
        self.actions
            .iter()
            .fold(PlanSummary::default(), |mut summary, action| {
                match action.action_type {
                    ActionType::Create => summary.create += 1,
                    ActionType::Update => summary.update += 1,
                    ActionType::Replace => summary.replace += 1,
                    ActionType::Delete => summary.delete += 1,
                    ActionType::NoOp => summary.no_change += 1,
                }
                summary
            })
    }
}

/// Action counts per type, printed under `plan`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}
