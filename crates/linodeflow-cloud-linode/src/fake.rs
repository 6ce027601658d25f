//! In-memory Linode API for tests
//!
//! [`FakeLinode`] keeps every entity in memory and mimics the behaviour the
//! controllers depend on: 404 for missing entities, disks that become ready
//! after a number of polls, attach/detach bookkeeping and call counters.

use crate::api::*;
use crate::error::{LinodeError, Result};
use crate::resources::DEFAULT_VOLUME_SIZE;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// 2018-01-01T00:01:01Z
const FIXED_TIMESTAMP: i64 = 1_514_764_861;

fn timestamp() -> Option<NaiveDateTime> {
    DateTime::from_timestamp(FIXED_TIMESTAMP, 0).map(|t| t.naive_utc())
}

fn bad_request(message: impl Into<String>) -> LinodeError {
    LinodeError::Api {
        status: 400,
        message: message.into(),
    }
}

struct FakeDisk {
    disk: InstanceDisk,
    polls_until_ready: u32,
}

#[derive(Default)]
struct FakeState {
    next_id: i64,
    sshkeys: BTreeMap<i64, SshKey>,
    volumes: BTreeMap<i64, Volume>,
    images: BTreeMap<String, Image>,
    instances: BTreeMap<i64, Instance>,
    disks: BTreeMap<(i64, i64), FakeDisk>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, u16>,
    drop_created_images: bool,
    image_updates: Vec<ImageUpdateOptions>,
}

impl FakeState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    fn record(&mut self, method: &'static str) -> Result<()> {
        *self.calls.entry(method).or_default() += 1;
        match self.failures.remove(method) {
            Some(status) => Err(LinodeError::Api {
                status,
                message: format!("injected failure for {}", method),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeLinode {
    state: Mutex<FakeState>,
}

impl FakeLinode {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of times an API method was called
    pub fn calls(&self, method: &str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    /// Make the next call of `method` fail with `status`
    pub fn fail_next(&self, method: &'static str, status: u16) {
        self.lock().failures.insert(method, status);
    }

    /// Images disappear right after they are created
    pub fn drop_created_images(&self) {
        self.lock().drop_created_images = true;
    }

    /// Register a disk that reports `not ready` for the given number of polls
    pub fn add_disk(&self, linode_id: i64, disk_id: i64, polls_until_ready: u32) {
        let status = if polls_until_ready == 0 {
            DiskStatus::Ready
        } else {
            DiskStatus::NotReady
        };
        self.lock().disks.insert(
            (linode_id, disk_id),
            FakeDisk {
                disk: InstanceDisk {
                    id: disk_id,
                    label: format!("disk-{}", disk_id),
                    status,
                    size: 25600,
                    filesystem: "ext4".to_string(),
                },
                polls_until_ready,
            },
        );
    }

    /// Insert an instance directly, bypassing the API
    pub fn add_instance(&self, label: &str, region: &str) -> i64 {
        let mut state = self.lock();
        let id = state.next_id();
        state.instances.insert(
            id,
            Instance {
                id,
                label: label.to_string(),
                region: region.to_string(),
                instance_type: "g6-nanode-1".to_string(),
                image: Some("linode/debian12".to_string()),
                status: InstanceStatus::Running,
                ipv4: vec![format!("192.0.2.{}", id % 250)],
                group: None,
                created: timestamp(),
                updated: timestamp(),
            },
        );
        id
    }

    pub fn volume(&self, id: i64) -> Option<Volume> {
        self.lock().volumes.get(&id).cloned()
    }

    pub fn image(&self, id: &str) -> Option<Image> {
        self.lock().images.get(id).cloned()
    }

    pub fn sshkey(&self, id: i64) -> Option<SshKey> {
        self.lock().sshkeys.get(&id).cloned()
    }

    /// Bodies of every `update_image` request, oldest first
    pub fn image_updates(&self) -> Vec<ImageUpdateOptions> {
        self.lock().image_updates.clone()
    }

    pub fn instance(&self, id: i64) -> Option<Instance> {
        self.lock().instances.get(&id).cloned()
    }

    /// Change a volume behind the controller's back
    pub fn set_volume_label(&self, id: i64, label: &str) {
        if let Some(volume) = self.lock().volumes.get_mut(&id) {
            volume.label = label.to_string();
        }
    }

    /// Delete a volume behind the controller's back
    pub fn remove_volume(&self, id: i64) {
        self.lock().volumes.remove(&id);
    }
}

#[async_trait]
impl LinodeApi for FakeLinode {
    async fn get_profile(&self) -> Result<Profile> {
        self.lock().record("get_profile")?;
        Ok(Profile {
            username: "fake".to_string(),
            email: "fake@example.com".to_string(),
        })
    }

    async fn get_sshkey(&self, id: i64) -> Result<SshKey> {
        let mut state = self.lock();
        state.record("get_sshkey")?;
        state
            .sshkeys
            .get(&id)
            .cloned()
            .ok_or_else(|| LinodeError::not_found(format!("sshkey {}", id)))
    }

    async fn create_sshkey(&self, opts: &SshKeyCreateOptions) -> Result<SshKey> {
        let mut state = self.lock();
        state.record("create_sshkey")?;
        if !opts.ssh_key.starts_with("ssh-") && !opts.ssh_key.starts_with("ecdsa-") {
            return Err(bad_request(
                "[ssh_key] SSH Key key-type must be ssh-dss, ssh-rsa, ecdsa-sha2-nistp, or ssh-ed25519.",
            ));
        }
        let id = state.next_id();
        let key = SshKey {
            id,
            label: opts.label.clone(),
            ssh_key: opts.ssh_key.clone(),
            created: timestamp(),
        };
        state.sshkeys.insert(id, key.clone());
        Ok(key)
    }

    async fn update_sshkey(&self, id: i64, opts: &SshKeyUpdateOptions) -> Result<SshKey> {
        let mut state = self.lock();
        state.record("update_sshkey")?;
        let key = state
            .sshkeys
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("sshkey {}", id)))?;
        if let Some(label) = &opts.label {
            key.label = label.clone();
        }
        Ok(key.clone())
    }

    async fn delete_sshkey(&self, id: i64) -> Result<()> {
        let mut state = self.lock();
        state.record("delete_sshkey")?;
        state
            .sshkeys
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LinodeError::not_found(format!("sshkey {}", id)))
    }

    async fn get_volume(&self, id: i64) -> Result<Volume> {
        let mut state = self.lock();
        state.record("get_volume")?;
        state
            .volumes
            .get(&id)
            .cloned()
            .ok_or_else(|| LinodeError::not_found(format!("volume {}", id)))
    }

    async fn create_volume(&self, opts: &VolumeCreateOptions) -> Result<Volume> {
        let mut state = self.lock();
        state.record("create_volume")?;
        let size = opts.size.unwrap_or(DEFAULT_VOLUME_SIZE);
        if size < 10 {
            return Err(bad_request("[size] Must be 10-10240"));
        }
        if let Some(linode_id) = opts.linode_id
            && !state.instances.contains_key(&linode_id)
        {
            return Err(bad_request("[linode_id] Linode not found"));
        }
        let id = state.next_id();
        let volume = Volume {
            id,
            label: opts.label.clone(),
            status: VolumeStatus::Active,
            region: opts.region.clone(),
            size,
            linode_id: opts.linode_id,
            filesystem_path: format!("/dev/disk/by-id/scsi-0Linode_Volume_{}", opts.label),
            created: timestamp(),
            updated: timestamp(),
        };
        state.volumes.insert(id, volume.clone());
        Ok(volume)
    }

    async fn update_volume(&self, id: i64, opts: &VolumeUpdateOptions) -> Result<Volume> {
        let mut state = self.lock();
        state.record("update_volume")?;
        let volume = state
            .volumes
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("volume {}", id)))?;
        if let Some(label) = &opts.label {
            volume.label = label.clone();
        }
        Ok(volume.clone())
    }

    async fn delete_volume(&self, id: i64) -> Result<()> {
        let mut state = self.lock();
        state.record("delete_volume")?;
        match state.volumes.get(&id) {
            None => Err(LinodeError::not_found(format!("volume {}", id))),
            Some(volume) if volume.linode_id.is_some() => {
                Err(bad_request("Volume must be detached before it can be deleted"))
            }
            Some(_) => {
                state.volumes.remove(&id);
                Ok(())
            }
        }
    }

    async fn attach_volume(&self, id: i64, opts: &VolumeAttachOptions) -> Result<Volume> {
        let mut state = self.lock();
        state.record("attach_volume")?;
        if !state.instances.contains_key(&opts.linode_id) {
            return Err(bad_request("[linode_id] Linode not found"));
        }
        let volume = state
            .volumes
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("volume {}", id)))?;
        if volume.linode_id.is_some() {
            return Err(bad_request("Volume is already attached to a Linode"));
        }
        volume.linode_id = Some(opts.linode_id);
        Ok(volume.clone())
    }

    async fn detach_volume(&self, id: i64) -> Result<()> {
        let mut state = self.lock();
        state.record("detach_volume")?;
        let volume = state
            .volumes
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("volume {}", id)))?;
        volume.linode_id = None;
        Ok(())
    }

    async fn resize_volume(&self, id: i64, size: i64) -> Result<Volume> {
        let mut state = self.lock();
        state.record("resize_volume")?;
        let volume = state
            .volumes
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("volume {}", id)))?;
        if size < volume.size {
            return Err(bad_request("[size] Volumes can only be resized up"));
        }
        volume.size = size;
        Ok(volume.clone())
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        let mut state = self.lock();
        state.record("get_image")?;
        state
            .images
            .get(id)
            .cloned()
            .ok_or_else(|| LinodeError::not_found(format!("image {}", id)))
    }

    async fn create_image(&self, opts: &ImageCreateOptions) -> Result<Image> {
        let mut state = self.lock();
        state.record("create_image")?;
        let disk = state
            .disks
            .iter()
            .find(|((_, disk_id), _)| *disk_id == opts.disk_id)
            .map(|(_, d)| d.disk.clone())
            .ok_or_else(|| LinodeError::not_found(format!("disk {}", opts.disk_id)))?;
        if disk.status != DiskStatus::Ready {
            return Err(bad_request("[disk_id] Disk is not ready"));
        }

        let id = format!("private/{}", state.next_id());
        let image = Image {
            id: id.clone(),
            label: opts.label.clone(),
            description: opts.description.clone(),
            created: timestamp(),
            created_by: "fake".to_string(),
            deprecated: false,
            is_public: false,
            size: disk.size,
            image_type: "manual".to_string(),
            expiry: None,
            vendor: None,
        };
        if !state.drop_created_images {
            state.images.insert(id, image.clone());
        }
        Ok(image)
    }

    async fn update_image(&self, id: &str, opts: &ImageUpdateOptions) -> Result<Image> {
        let mut state = self.lock();
        state.record("update_image")?;
        state.image_updates.push(opts.clone());
        let image = state
            .images
            .get_mut(id)
            .ok_or_else(|| LinodeError::not_found(format!("image {}", id)))?;
        if let Some(label) = &opts.label {
            image.label = label.clone();
        }
        if let Some(description) = &opts.description {
            image.description = Some(description.clone());
        }
        Ok(image.clone())
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.record("delete_image")?;
        state
            .images
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| LinodeError::not_found(format!("image {}", id)))
    }

    async fn get_instance(&self, id: i64) -> Result<Instance> {
        let mut state = self.lock();
        state.record("get_instance")?;
        state
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| LinodeError::not_found(format!("linode {}", id)))
    }

    async fn create_instance(&self, opts: &InstanceCreateOptions) -> Result<Instance> {
        let mut state = self.lock();
        state.record("create_instance")?;
        if opts.image.is_some() && opts.root_pass.is_none() && opts.authorized_keys.is_empty() {
            return Err(bad_request("[root_pass] root_pass is required when deploying an image"));
        }
        let id = state.next_id();
        let instance = Instance {
            id,
            label: opts.label.clone(),
            region: opts.region.clone(),
            instance_type: opts.instance_type.clone(),
            image: opts.image.clone(),
            status: if opts.image.is_some() {
                InstanceStatus::Running
            } else {
                InstanceStatus::Offline
            },
            ipv4: vec![format!("192.0.2.{}", id % 250)],
            group: opts.group.clone(),
            created: timestamp(),
            updated: timestamp(),
        };
        state.instances.insert(id, instance.clone());
        Ok(instance)
    }

    async fn update_instance(&self, id: i64, opts: &InstanceUpdateOptions) -> Result<Instance> {
        let mut state = self.lock();
        state.record("update_instance")?;
        let instance = state
            .instances
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("linode {}", id)))?;
        if let Some(label) = &opts.label {
            instance.label = label.clone();
        }
        if let Some(group) = &opts.group {
            instance.group = Some(group.clone()).filter(|g| !g.is_empty());
        }
        Ok(instance.clone())
    }

    async fn resize_instance(&self, id: i64, instance_type: &str) -> Result<()> {
        let mut state = self.lock();
        state.record("resize_instance")?;
        let instance = state
            .instances
            .get_mut(&id)
            .ok_or_else(|| LinodeError::not_found(format!("linode {}", id)))?;
        instance.instance_type = instance_type.to_string();
        Ok(())
    }

    async fn delete_instance(&self, id: i64) -> Result<()> {
        let mut state = self.lock();
        state.record("delete_instance")?;
        if state.instances.remove(&id).is_none() {
            return Err(LinodeError::not_found(format!("linode {}", id)));
        }
        for volume in state.volumes.values_mut() {
            if volume.linode_id == Some(id) {
                volume.linode_id = None;
            }
        }
        Ok(())
    }

    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<InstanceDisk> {
        let mut state = self.lock();
        state.record("get_instance_disk")?;
        let fake = state.disks.get_mut(&(linode_id, disk_id)).ok_or_else(|| {
            LinodeError::not_found(format!("disk {} of linode {}", disk_id, linode_id))
        })?;
        if fake.polls_until_ready > 0 {
            fake.polls_until_ready -= 1;
        } else {
            fake.disk.status = DiskStatus::Ready;
        }
        Ok(fake.disk.clone())
    }
}
