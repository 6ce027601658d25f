//! Resource controllers for Linode entities
//!
//! Each controller implements [`linodeflow_cloud::Resource`] over
//! `dyn LinodeApi` and translates between the attribute bag and a typed
//! spec struct field by field.

mod image;
mod instance;
mod sshkey;
mod volume;

pub use image::ImageResource;
pub use instance::InstanceResource;
pub use sshkey::SshKeyResource;
pub use volume::{DEFAULT_VOLUME_SIZE, VolumeResource};

use crate::api::{LinodeApi, format_timestamp};
use crate::error::LinodeError;
use chrono::NaiveDateTime;
use linodeflow_cloud::{CloudError, Result, ResourceData};

/// Client handle the controllers are implemented for
pub type Client = dyn LinodeApi;

/// Record an optional API timestamp; absent timestamps leave the bag as is
fn set_timestamp(data: &mut ResourceData, key: &str, timestamp: Option<&NaiveDateTime>) {
    data.set_opt(key, timestamp.map(format_timestamp));
}

/// Outcome of a GET used by `exists` and `read`
fn found<T>(result: std::result::Result<T, LinodeError>) -> Result<Option<T>> {
    match result {
        Ok(entity) => Ok(Some(entity)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Clear the ID of a resource that no longer exists
fn vanished(data: &mut ResourceData) {
    tracing::warn!(
        "{} {} no longer exists, removing it from state",
        data.resource_type(),
        data.id()
    );
    data.clear_id();
}

/// Fail a create whose resource was gone when read back
fn created(data: &ResourceData, id: impl std::fmt::Display) -> Result<()> {
    if data.has_id() {
        Ok(())
    } else {
        Err(CloudError::CreationFailed(format!(
            "{} {} failed to be created",
            data.resource_type(),
            id
        )))
    }
}

/// Treat a not-found answer to a delete as success
fn deleted(result: std::result::Result<(), LinodeError>, data: &mut ResourceData) -> Result<()> {
    match result {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            tracing::debug!("{} {} was already deleted", data.resource_type(), data.id());
        }
        Err(e) => return Err(e.into()),
    }
    data.clear_id();
    Ok(())
}
