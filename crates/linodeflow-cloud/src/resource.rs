//! Resource controller trait
//!
//! Every managed resource type implements [`Resource`] for the client handle
//! of its provider. The client is passed explicitly to each call; controllers
//! hold no state of their own beyond their schema.

use crate::data::ResourceData;
use crate::error::{CloudError, Result};
use crate::schema::Schema;
use async_trait::async_trait;

#[async_trait]
pub trait Resource<C: ?Sized + Sync>: Send + Sync {
    /// Resource type name used in manifests and state keys
    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    /// Dependency rank: lower ranks are created first and deleted last
    fn rank(&self) -> u8 {
        0
    }

    /// Whether the entity behind `data.id()` exists.
    ///
    /// Returns `Ok(false)` when the API reports it as not found and an
    /// error for any other failure.
    async fn exists(&self, client: &C, data: &ResourceData) -> Result<bool>;

    /// Refresh `data` from the remote entity. Clears the ID when the entity
    /// has vanished.
    async fn read(&self, client: &C, data: &mut ResourceData) -> Result<()>;

    /// Create the entity described by the desired configuration and record
    /// its ID and attributes.
    async fn create(&self, client: &C, data: &mut ResourceData) -> Result<()>;

    /// Push changed, non-force-new fields to the remote entity.
    async fn update(&self, client: &C, data: &mut ResourceData) -> Result<()>;

    /// Delete the entity and clear the ID. Deleting an absent entity succeeds.
    async fn delete(&self, client: &C, data: &mut ResourceData) -> Result<()>;

    /// Passthrough import: the given ID is used verbatim as the identity.
    async fn import(&self, client: &C, id: &str) -> Result<ResourceData> {
        let mut data = ResourceData::new(self.resource_type());
        data.set_id(id);
        self.read(client, &mut data).await?;
        if !data.has_id() {
            return Err(CloudError::ResourceNotFound(format!(
                "{} {}",
                self.resource_type(),
                id
            )));
        }
        Ok(data)
    }
}
