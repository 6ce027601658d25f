use super::{Client, created, deleted, found, set_timestamp, vanished};
use crate::api::{DiskStatus, Image, ImageCreateOptions, ImageUpdateOptions};
use crate::wait::wait_for_disk_status;
use async_trait::async_trait;
use linodeflow_cloud::{
    CloudError, Field, FieldKind, Operation, Resource, ResourceData, Result, Schema, WaitConfig,
};

/// Attributes the API does not echo back; they are kept from the
/// configuration so the recorded state stays comparable.
const SOURCE_FIELDS: [&str; 2] = ["disk_id", "linode_id"];

/// `image`: a private image captured from an instance disk
pub struct ImageResource {
    schema: Schema,
    wait: WaitConfig,
}

impl ImageResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(
                "image",
                vec![
                    Field::required("label", FieldKind::String)
                        .describe("A short description of the Image. Labels cannot contain special characters."),
                    Field::required("disk_id", FieldKind::Int)
                        .force_new()
                        .describe("The ID of the Linode Disk that this Image will be created from."),
                    Field::required("linode_id", FieldKind::Int)
                        .force_new()
                        .describe("The ID of the Linode that this Image will be created from."),
                    Field::optional("description", FieldKind::String)
                        .describe("A detailed description of this Image."),
                    Field::computed("created", FieldKind::String),
                    Field::computed("created_by", FieldKind::String),
                    Field::computed("deprecated", FieldKind::Bool),
                    Field::computed("is_public", FieldKind::Bool),
                    Field::computed("size", FieldKind::Int),
                    Field::computed("type", FieldKind::String),
                    Field::computed("expiry", FieldKind::String),
                    Field::computed("vendor", FieldKind::String),
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

impl Default for ImageResource {
    fn default() -> Self {
        Self::new()
    }
}

struct ImageSpec {
    label: String,
    disk_id: i64,
    linode_id: i64,
    description: Option<String>,
}

impl ImageSpec {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            label: data.require_str("label")?.to_string(),
            disk_id: data.require_i64("disk_id")?,
            linode_id: data.require_i64("linode_id")?,
            description: data.get_str("description").map(str::to_string),
        })
    }
}

fn image_id(data: &ResourceData) -> Result<String> {
    if data.has_id() {
        Ok(data.id().to_string())
    } else {
        Err(CloudError::invalid_id("image", "", "image IDs cannot be empty"))
    }
}

fn write_state(data: &mut ResourceData, image: &Image) {
    for key in SOURCE_FIELDS {
        if let Some(value) = data.get(key).cloned() {
            data.set(key, value);
        }
    }

    data.set("label", image.label.as_str());
    data.set("description", image.description.clone().unwrap_or_default());
    data.set("created_by", image.created_by.as_str());
    data.set("deprecated", image.deprecated);
    data.set("is_public", image.is_public);
    data.set("size", image.size);
    data.set("type", image.image_type.as_str());
    data.set_opt("vendor", image.vendor.clone());
    set_timestamp(data, "created", image.created.as_ref());
    set_timestamp(data, "expiry", image.expiry.as_ref());
}

#[async_trait]
impl Resource<Client> for ImageResource {
    fn resource_type(&self) -> &'static str {
        "image"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rank(&self) -> u8 {
        3
    }

    async fn exists(&self, client: &Client, data: &ResourceData) -> Result<bool> {
        let id = image_id(data)?;
        Ok(found(client.get_image(&id).await)?.is_some())
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = image_id(data)?;
        match found(client.get_image(&id).await)? {
            Some(image) => write_state(data, &image),
            None => vanished(data),
        }
        Ok(())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let spec = ImageSpec::from_data(data)?;
        let timeout = data.timeout(Operation::Create);

        wait_for_disk_status(
            client,
            spec.linode_id,
            spec.disk_id,
            DiskStatus::Ready,
            timeout,
            &self.wait,
        )
        .await?;

        let image = client
            .create_image(&ImageCreateOptions {
                disk_id: spec.disk_id,
                label: spec.label,
                description: spec.description,
            })
            .await?;
        data.set_id(image.id.as_str());

        // The disk is busy while the image is captured
        wait_for_disk_status(
            client,
            spec.linode_id,
            spec.disk_id,
            DiskStatus::Ready,
            timeout,
            &self.wait,
        )
        .await?;

        self.read(client, data).await?;
        created(data, &image.id)
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = image_id(data)?;

        if data.has_change("label") || data.has_change("description") {
            let mut opts = ImageUpdateOptions::default();
            if data.has_change("label") {
                opts.label = Some(data.require_str("label")?.to_string());
            }
            if data.has_change("description") {
                opts.description = Some(
                    data.get_config("description")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                );
            }
            client.update_image(&id, &opts).await?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = image_id(data)?;
        let result = client.delete_image(&id).await;
        deleted(result, data)
    }
}
