//! Linode API contract and typed entities
//!
//! [`LinodeApi`] is the client contract the resource controllers are written
//! against. [`crate::LinodeClient`] implements it over HTTP; the in-memory
//! `FakeLinode` implements it for tests.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait LinodeApi: Send + Sync {
    /// Profile of the token owner
    async fn get_profile(&self) -> Result<Profile>;

    async fn get_sshkey(&self, id: i64) -> Result<SshKey>;
    async fn create_sshkey(&self, opts: &SshKeyCreateOptions) -> Result<SshKey>;
    async fn update_sshkey(&self, id: i64, opts: &SshKeyUpdateOptions) -> Result<SshKey>;
    async fn delete_sshkey(&self, id: i64) -> Result<()>;

    async fn get_volume(&self, id: i64) -> Result<Volume>;
    async fn create_volume(&self, opts: &VolumeCreateOptions) -> Result<Volume>;
    async fn update_volume(&self, id: i64, opts: &VolumeUpdateOptions) -> Result<Volume>;
    async fn delete_volume(&self, id: i64) -> Result<()>;
    async fn attach_volume(&self, id: i64, opts: &VolumeAttachOptions) -> Result<Volume>;
    async fn detach_volume(&self, id: i64) -> Result<()>;
    async fn resize_volume(&self, id: i64, size: i64) -> Result<Volume>;

    async fn get_image(&self, id: &str) -> Result<Image>;
    async fn create_image(&self, opts: &ImageCreateOptions) -> Result<Image>;
    async fn update_image(&self, id: &str, opts: &ImageUpdateOptions) -> Result<Image>;
    async fn delete_image(&self, id: &str) -> Result<()>;

    async fn get_instance(&self, id: i64) -> Result<Instance>;
    async fn create_instance(&self, opts: &InstanceCreateOptions) -> Result<Instance>;
    async fn update_instance(&self, id: i64, opts: &InstanceUpdateOptions) -> Result<Instance>;
    async fn resize_instance(&self, id: i64, instance_type: &str) -> Result<()>;
    async fn delete_instance(&self, id: i64) -> Result<()>;

    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<InstanceDisk>;
}

/// Render an API timestamp (UTC, no offset on the wire) as RFC 3339
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshKey {
    pub id: i64,
    pub label: String,
    pub ssh_key: String,
    pub created: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SshKeyCreateOptions {
    pub label: String,
    pub ssh_key: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SshKeyUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
    Creating,
    Active,
    Resizing,
    ContactSupport,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VolumeStatus::Creating => write!(f, "creating"),
            VolumeStatus::Active => write!(f, "active"),
            VolumeStatus::Resizing => write!(f, "resizing"),
            VolumeStatus::ContactSupport => write!(f, "contact_support"),
            VolumeStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: i64,
    pub label: String,
    pub status: VolumeStatus,
    pub region: String,
    pub size: i64,
    pub linode_id: Option<i64>,
    #[serde(default)]
    pub filesystem_path: String,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeCreateOptions {
    pub label: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linode_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VolumeUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeAttachOptions {
    pub linode_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub size: i64,
    #[serde(rename = "type", default)]
    pub image_type: String,
    pub expiry: Option<NaiveDateTime>,
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageCreateOptions {
    pub disk_id: i64,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Running,
    Offline,
    Booting,
    Rebooting,
    ShuttingDown,
    Provisioning,
    Deleting,
    Migrating,
    Rebuilding,
    Cloning,
    Restoring,
    Resizing,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Offline => "offline",
            InstanceStatus::Booting => "booting",
            InstanceStatus::Rebooting => "rebooting",
            InstanceStatus::ShuttingDown => "shutting_down",
            InstanceStatus::Provisioning => "provisioning",
            InstanceStatus::Deleting => "deleting",
            InstanceStatus::Migrating => "migrating",
            InstanceStatus::Rebuilding => "rebuilding",
            InstanceStatus::Cloning => "cloning",
            InstanceStatus::Restoring => "restoring",
            InstanceStatus::Resizing => "resizing",
            InstanceStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: i64,
    pub label: String,
    pub region: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub image: Option<String>,
    pub status: InstanceStatus,
    #[serde(default)]
    pub ipv4: Vec<String>,
    pub group: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstanceCreateOptions {
    pub label: String,
    pub region: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_pass: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstanceUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiskStatus {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
    #[serde(rename = "deleting")]
    Deleting,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for DiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiskStatus::Ready => write!(f, "ready"),
            DiskStatus::NotReady => write!(f, "not ready"),
            DiskStatus::Deleting => write!(f, "deleting"),
            DiskStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDisk {
    pub id: i64,
    pub label: String,
    pub status: DiskStatus,
    pub size: i64,
    #[serde(default)]
    pub filesystem: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_volume_deserialize_detached() {
        let volume: Volume = serde_json::from_value(json!({
            "id": 12345,
            "label": "my-volume",
            "status": "active",
            "region": "us-west",
            "size": 30,
            "linode_id": null,
            "filesystem_path": "/dev/disk/by-id/scsi-0Linode_Volume_my-volume",
            "created": "2018-01-01T00:01:01",
            "updated": "2018-01-01T00:01:01",
            "tags": []
        }))
        .unwrap();

        assert_eq!(volume.status, VolumeStatus::Active);
        assert_eq!(volume.linode_id, None);
        assert_eq!(
            format_timestamp(&volume.created.unwrap()),
            "2018-01-01T00:01:01Z"
        );
    }

    #[test]
    fn test_image_deserialize_private() {
        let image: Image = serde_json::from_value(json!({
            "id": "private/67848373",
            "label": "golden",
            "description": null,
            "created": "2021-08-14T22:44:02",
            "created_by": "somename",
            "deprecated": false,
            "is_public": false,
            "size": 2500,
            "type": "manual",
            "expiry": null,
            "vendor": null
        }))
        .unwrap();

        assert_eq!(image.description, None);
        assert_eq!(image.image_type, "manual");
        assert!(image.expiry.is_none());
        assert!(image.vendor.is_none());
    }

    #[test]
    fn test_status_fallbacks() {
        let disk: DiskStatus = serde_json::from_value(json!("not ready")).unwrap();
        assert_eq!(disk, DiskStatus::NotReady);
        let unknown: InstanceStatus = serde_json::from_value(json!("stopped")).unwrap();
        assert_eq!(unknown, InstanceStatus::Unknown);
        assert_eq!(InstanceStatus::ShuttingDown.to_string(), "shutting_down");
    }

    #[test]
    fn test_update_options_skip_unset_fields() {
        let opts = VolumeUpdateOptions::default();
        assert_eq!(serde_json::to_value(&opts).unwrap(), json!({}));
    }
}
