//! Readiness waiters for Linode entities
//!
//! Thin wrappers over [`wait_until`] that poll one entity until it reaches
//! the wanted status. API errors end the wait immediately.

use crate::api::{
    DiskStatus, Instance, InstanceDisk, InstanceStatus, LinodeApi, Volume, VolumeStatus,
};
use linodeflow_cloud::{CloudError, Result, WaitConfig, wait_until};
use std::time::Duration;

/// Wait until a disk of an instance reports `status`
pub async fn wait_for_disk_status(
    client: &dyn LinodeApi,
    linode_id: i64,
    disk_id: i64,
    status: DiskStatus,
    timeout: Duration,
    config: &WaitConfig,
) -> Result<InstanceDisk> {
    let what = format!("disk {} of linode {} to become {}", disk_id, linode_id, status);
    wait_until(&what, timeout, config, move || async move {
        let disk = client.get_instance_disk(linode_id, disk_id).await?;
        Ok::<_, CloudError>((disk.status == status).then_some(disk))
    })
    .await
}

/// Wait until a volume reports `status`
pub async fn wait_for_volume_status(
    client: &dyn LinodeApi,
    volume_id: i64,
    status: VolumeStatus,
    timeout: Duration,
    config: &WaitConfig,
) -> Result<Volume> {
    let what = format!("volume {} to become {}", volume_id, status);
    wait_until(&what, timeout, config, move || async move {
        let volume = client.get_volume(volume_id).await?;
        Ok::<_, CloudError>((volume.status == status).then_some(volume))
    })
    .await
}

/// Wait until a volume is attached to `linode_id`, or detached when `None`
pub async fn wait_for_volume_attachment(
    client: &dyn LinodeApi,
    volume_id: i64,
    linode_id: Option<i64>,
    timeout: Duration,
    config: &WaitConfig,
) -> Result<Volume> {
    let what = match linode_id {
        Some(linode_id) => format!("volume {} to attach to linode {}", volume_id, linode_id),
        None => format!("volume {} to detach", volume_id),
    };
    wait_until(&what, timeout, config, move || async move {
        let volume = client.get_volume(volume_id).await?;
        Ok::<_, CloudError>((volume.linode_id == linode_id).then_some(volume))
    })
    .await
}

/// Wait until an instance reports `status`
pub async fn wait_for_instance_status(
    client: &dyn LinodeApi,
    linode_id: i64,
    status: InstanceStatus,
    timeout: Duration,
    config: &WaitConfig,
) -> Result<Instance> {
    let what = format!("linode {} to become {}", linode_id, status);
    wait_until(&what, timeout, config, move || async move {
        let instance = client.get_instance(linode_id).await?;
        Ok::<_, CloudError>((instance.status == status).then_some(instance))
    })
    .await
}
