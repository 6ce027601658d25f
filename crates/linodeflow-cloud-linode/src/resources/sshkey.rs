use super::{Client, created, deleted, found, set_timestamp, vanished};
use crate::api::{SshKey, SshKeyCreateOptions, SshKeyUpdateOptions};
use async_trait::async_trait;
use linodeflow_cloud::{Field, FieldKind, Resource, ResourceData, Result, Schema};

/// `sshkey`: a public key stored in the token owner's profile
pub struct SshKeyResource {
    schema: Schema,
}

impl SshKeyResource {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(
                "sshkey",
                vec![
                    Field::required("label", FieldKind::String)
                        .describe("The label of the Linode SSH Key."),
                    Field::required("ssh_key", FieldKind::String)
                        .force_new()
                        .describe("The public SSH Key, which is used to authenticate to the root user of the Linodes you deploy."),
                    Field::computed("created", FieldKind::String)
                        .describe("The date this key was added."),
                ],
            ),
        }
    }
}

impl Default for SshKeyResource {
    fn default() -> Self {
        Self::new()
    }
}

struct SshKeySpec {
    label: String,
    ssh_key: String,
}

impl SshKeySpec {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            label: data.require_str("label")?.to_string(),
            ssh_key: data.require_str("ssh_key")?.to_string(),
        })
    }
}

fn write_state(data: &mut ResourceData, key: &SshKey) {
    data.set("label", key.label.as_str());
    data.set("ssh_key", key.ssh_key.as_str());
    set_timestamp(data, "created", key.created.as_ref());
}

#[async_trait]
impl Resource<Client> for SshKeyResource {
    fn resource_type(&self) -> &'static str {
        "sshkey"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn exists(&self, client: &Client, data: &ResourceData) -> Result<bool> {
        let id = data.numeric_id()?;
        Ok(found(client.get_sshkey(id).await)?.is_some())
    }

    async fn read(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        match found(client.get_sshkey(id).await)? {
            Some(key) => write_state(data, &key),
            None => vanished(data),
        }
        Ok(())
    }

    async fn create(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let spec = SshKeySpec::from_data(data)?;
        let key = client
            .create_sshkey(&SshKeyCreateOptions {
                label: spec.label,
                ssh_key: spec.ssh_key,
            })
            .await?;

        data.set_id(key.id.to_string());
        self.read(client, data).await?;
        created(data, key.id)
    }

    async fn update(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;

        if data.has_change("label") {
            let opts = SshKeyUpdateOptions {
                label: Some(data.require_str("label")?.to_string()),
            };
            client.update_sshkey(id, &opts).await?;
        }

        self.read(client, data).await
    }

    async fn delete(&self, client: &Client, data: &mut ResourceData) -> Result<()> {
        let id = data.numeric_id()?;
        let result = client.delete_sshkey(id).await;
        deleted(result, data)
    }
}
