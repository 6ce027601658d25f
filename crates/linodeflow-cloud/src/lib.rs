//! LinodeFlow cloud resource reconciliation
//!
//! Provider-neutral building blocks for declarative resource management:
//! resource schemas, the per-operation [`ResourceData`] handle, controller
//! trait [`Resource`], the [`Reconciler`] that drives controllers from a
//! plan, readiness polling and the on-disk state store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 linodeflow CLI                   │
//! │          (plan / apply / refresh / import)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               linodeflow-cloud                   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  Reconciler  │  │  State Mgmt  │            │
//! │  └──────┬───────┘  └──────────────┘            │
//! │  ┌──────▼──────────────────────────────────┐   │
//! │  │  trait Resource<C> { exists, read, ... } │   │
//! │  └─────────────────────────────────────────┘   │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼────────────────┐
//! │ linodeflow-cloud-linode │
//! │ sshkey volume image ... │
//! └────────────────────────┘
//! ```

pub mod action;
pub mod data;
pub mod diff;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod resource;
pub mod schema;
pub mod state;
pub mod waiter;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use data::{Attributes, Operation, ResourceData, Timeouts};
pub use diff::{
    DriftReport, detect_drift, detect_optional_change, detect_optional_int_change, non_zero,
};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider, ResourceConfig, ResourceSet, resource_key};
pub use reconciler::Reconciler;
pub use resource::Resource;
pub use schema::{Field, FieldKind, FieldMode, Schema};
pub use state::{
    GlobalState, ResourceState, ResourceStatus, StateLock, StateManager, split_state_key,
    state_key,
};
pub use waiter::{WaitConfig, wait_until};
