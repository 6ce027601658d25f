use super::{Client, created, deleted, found, set_timestamp, vanished};
use crate::api::{Instance, InstanceCreateOptions, InstanceStatus, InstanceUpdateOptions};
use crate::wait::wait_for_instance_status;
use async_trait::async_trait;
use linodeflow_cloud::{
    Field, FieldKind, Operation, Resource, ResourceData, Result, Schema, WaitConfig,
};
use serde_json::Value;

/// Create-only attributes the API never returns
const WRITE_ONLY_FIELDS: [&str; 2] = ["root_pass", "authorized_keys"];

/// `instance`: a Linode virtual machine
pub struct InstanceResource {
    schema: Schema,
    wait: WaitConfig,
}

impl InstanceResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(
                "instance",
                vec![
                    Field::required("label", FieldKind::String)
                        .describe("The Linode's label is for display purposes only."),
                    Field::required("region", FieldKind::String)
                        .force_new()
                        .describe("This is the location where the Linode was deployed."),
                    Field::required("type", FieldKind::String)
                        .describe("The Linode type defines the pricing, CPU, disk, and RAM specs of the instance."),
                    Field::optional("image", FieldKind::String)
                        .force_new()
                        .describe("An Image ID to deploy the Disk from."),
                    Field::optional("root_pass", FieldKind::String)
                        .force_new()
                        .sensitive()
                        .describe("The initial password for the root user account."),
                    Field::optional("authorized_keys", FieldKind::List)
                        .force_new()
                        .describe("A list of SSH public keys to deploy for the root user."),
                    Field::optional("group", FieldKind::String)
                        .describe("The display group of the Linode instance."),
                    Field::computed("status", FieldKind::String),
                    Field::computed("ipv4", FieldKind::List),
                    Field::computed("created", FieldKind::String),
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

impl Default for InstanceResource {
    fn default() -> Self {
        Self::new()
    }
}

struct InstanceSpec {
    label: String,
    region: String,
    instance_type: String,
    image: Option<String>,
    root_pass: Option<String>,
    authorized_keys: Vec<String>,
    group: Option<String>,
}

impl InstanceSpec {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            label: data.require_str("label")?.to_string(),
            region: data.require_str("region")?.to_string(),
            instance_type: data.require_str("type")?.to_string(),
            image: data.get_str("image").map(str::to_string),
            root_pass: data.get_str("root_pass").map(str::to_string),
            authorized_keys: data.get_string_list("authorized_keys"),
            group: data.get_str("group").map(str::to_string),
        })
    }
}

fn write_state(data: &mut ResourceData, instance: &Instance) {
    for key in WRITE_ONLY_FIELDS {
        if let Some(value) = data.get(key).cloned() {
            data.set(key, value);
        }
    }

    data.set("label", instance.label.as_str());
    data.set("region", instance.region.as_str());
    data.set("type", instance.instance_type.as_str());
    data.set_opt("image", instance.image.clone());
    data.set("group", instance.group.clone().unwrap_or_default());
    data.set("status", instance.status.to_string());
    data.set("ipv4", instance.ipv4.clone());
    set_timestamp(data, "created", instance.created.as_ref());
}

#[async_trait]
impl Resource<Client> for InstanceResource {
    fn resource_type(&self) -> &'static str {
        "instance"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rank(&self) -> u8 {
        1
    }

    async fn exists(&self, client: &Client, data: &ResourceData) -> Result<bool> {
        let id = data.numeric_id()?;
        Ok(found(client.get_instance(id).await)?.is_some())
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        match found(client.get_instance(id).await)? {
            Some(instance) => write_state(data, &instance),
            None => vanished(data),
        }
        Ok(())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let spec = InstanceSpec::from_data(data)?;
        let boots = spec.image.is_some();

        let instance = client
            .create_instance(&InstanceCreateOptions {
                label: spec.label,
                region: spec.region,
                instance_type: spec.instance_type,
                image: spec.image,
                root_pass: spec.root_pass,
                authorized_keys: spec.authorized_keys,
                group: spec.group,
            })
            .await?;
        data.set_id(instance.id.to_string());

        // Instances without an image have nothing to boot
        if boots {
            let timeout = data.timeout(Operation::Create);
            wait_for_instance_status(
                client,
                instance.id,
                InstanceStatus::Running,
                timeout,
                &self.wait,
            )
            .await?;
        }

        self.read(client, data).await?;
        created(data, instance.id)
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;

        if data.has_change("label") || data.has_change("group") {
            let mut opts = InstanceUpdateOptions::default();
            if data.has_change("label") {
                opts.label = Some(data.require_str("label")?.to_string());
            }
            if data.has_change("group") {
                opts.group = Some(
                    data.get_config("group")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                );
            }
            client.update_instance(id, &opts).await?;
        }

        if data.has_change("type") {
            let resume = data
                .get_state("status")
                .and_then(|v| serde_json::from_value::<InstanceStatus>(v.clone()).ok())
                .filter(|s| *s == InstanceStatus::Offline)
                .unwrap_or(InstanceStatus::Running);
            let instance_type = data.require_str("type")?.to_string();

            tracing::info!("Resizing linode {} to {}", id, instance_type);
            client.resize_instance(id, &instance_type).await?;
            let timeout = data.timeout(Operation::Update);
            wait_for_instance_status(client, id, resume, timeout, &self.wait).await?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        let result = client.delete_instance(id).await;
        deleted(result, data)
    }
}
