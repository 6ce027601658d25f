use super::{Client, created, deleted, found, set_timestamp, vanished};
use crate::api::{
    Volume, VolumeAttachOptions, VolumeCreateOptions, VolumeStatus, VolumeUpdateOptions,
};
use crate::wait::{wait_for_volume_attachment, wait_for_volume_status};
use async_trait::async_trait;
use linodeflow_cloud::{
    CloudError, Field, FieldKind, Operation, Resource, ResourceData, Result, Schema, WaitConfig,
    detect_optional_int_change, non_zero,
};
use serde_json::Value;

/// Size the API assigns when none is requested (GiB)
pub const DEFAULT_VOLUME_SIZE: i64 = 20;

/// `volume`: block storage, optionally attached to one instance
pub struct VolumeResource {
    schema: Schema,
    wait: WaitConfig,
}

impl VolumeResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(
                "volume",
                vec![
                    Field::required("label", FieldKind::String)
                        .describe("The label of the Linode Volume."),
                    Field::required("region", FieldKind::String)
                        .force_new()
                        .describe("The region where this volume will be deployed."),
                    Field::optional_computed("size", FieldKind::Int)
                        .describe("Size of the Volume in GB. Volumes can only grow."),
                    Field::optional("linode_id", FieldKind::Int)
                        .describe("The Linode ID where the Volume should be attached. Unset to detach."),
                    Field::computed("status", FieldKind::String),
                    Field::computed("filesystem_path", FieldKind::String),
                    Field::computed("created", FieldKind::String),
                    Field::computed("updated", FieldKind::String),
                ],
            ),
            wait: WaitConfig::default(),
        }
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }
}

impl Default for VolumeResource {
    fn default() -> Self {
        Self::new()
    }
}

fn config_i64(data: &ResourceData, key: &str) -> Option<i64> {
    data.get_config(key).and_then(Value::as_i64)
}

struct VolumeSpec {
    label: String,
    region: String,
    size: Option<i64>,
    linode_id: Option<i64>,
}

impl VolumeSpec {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            label: data.require_str("label")?.to_string(),
            region: data.require_str("region")?.to_string(),
            size: config_i64(data, "size"),
            linode_id: config_i64(data, "linode_id").and_then(non_zero),
        })
    }
}

fn write_state(data: &mut ResourceData, volume: &Volume) {
    data.set("label", volume.label.as_str());
    data.set("region", volume.region.as_str());
    data.set("size", volume.size);
    data.set("linode_id", volume.linode_id.unwrap_or(0));
    data.set("status", volume.status.to_string());
    data.set("filesystem_path", volume.filesystem_path.as_str());
    set_timestamp(data, "created", volume.created.as_ref());
    set_timestamp(data, "updated", volume.updated.as_ref());
}

#[async_trait]
impl Resource<Client> for VolumeResource {
    fn resource_type(&self) -> &'static str {
        "volume"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rank(&self) -> u8 {
        2
    }

    async fn exists(&self, client: &Client, data: &ResourceData) -> Result<bool> {
        let id = data.numeric_id()?;
        Ok(found(client.get_volume(id).await)?.is_some())
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        match found(client.get_volume(id).await)? {
            Some(volume) => write_state(data, &volume),
            None => vanished(data),
        }
        Ok(())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let spec = VolumeSpec::from_data(data)?;
        let timeout = data.timeout(Operation::Create);

        let volume = client
            .create_volume(&VolumeCreateOptions {
                label: spec.label,
                region: spec.region,
                size: spec.size,
                linode_id: spec.linode_id,
            })
            .await?;
        data.set_id(volume.id.to_string());

        wait_for_volume_status(client, volume.id, VolumeStatus::Active, timeout, &self.wait).await?;
        if spec.linode_id.is_some() {
            wait_for_volume_attachment(client, volume.id, spec.linode_id, timeout, &self.wait)
                .await?;
        }

        self.read(client, data).await?;
        created(data, volume.id)
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        let timeout = data.timeout(Operation::Update);

        if data.has_change("label") {
            let opts = VolumeUpdateOptions {
                label: Some(data.require_str("label")?.to_string()),
            };
            client.update_volume(id, &opts).await?;
        }

        if let Some(want) = config_i64(data, "size") {
            let have = data.get_state("size").and_then(Value::as_i64).unwrap_or(0);
            if want < have {
                return Err(CloudError::InvalidConfig(format!(
                    "volume {} cannot shrink from {} GB to {} GB",
                    id, have, want
                )));
            }
            if want > have {
                client.resize_volume(id, want).await?;
                wait_for_volume_status(client, id, VolumeStatus::Active, timeout, &self.wait)
                    .await?;
            }
        }

        let have = data
            .get_state("linode_id")
            .and_then(Value::as_i64)
            .and_then(non_zero);
        let want = config_i64(data, "linode_id").and_then(non_zero);

        if detect_optional_int_change(have, want) {
            if let Some(from) = have {
                tracing::info!("Detaching volume {} from linode {}", id, from);
                client.detach_volume(id).await?;
                wait_for_volume_attachment(client, id, None, timeout, &self.wait).await?;
            }
            if let Some(to) = want {
                tracing::info!("Attaching volume {} to linode {}", id, to);
                client
                    .attach_volume(id, &VolumeAttachOptions { linode_id: to })
                    .await?;
                wait_for_volume_attachment(client, id, Some(to), timeout, &self.wait).await?;
            }
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;

        // Attached volumes cannot be deleted
        if let Some(volume) = found(client.get_volume(id).await)?
            && volume.linode_id.is_some()
        {
            client.detach_volume(id).await?;
            let timeout = data.timeout(Operation::Delete);
            wait_for_volume_attachment(client, id, None, timeout, &self.wait).await?;
        }

        let result = client.delete_volume(id).await;
        deleted(result, data)
    }
}
