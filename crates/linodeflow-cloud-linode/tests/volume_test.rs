mod common;

use common::{TestApi, change, desired};
use linodeflow_cloud::{CloudError, Resource, ResourceData};
use linodeflow_cloud_linode::VolumeResource;
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn test_volume_attach_detach_scenario() {
    let api = TestApi::new();
    let volume = VolumeResource::new();
    let instance_id = api.fake.add_instance("web", "us-west");

    let mut data = desired("volume", json!({"label": "v1", "region": "us-west"}));
    volume.create(api.client.as_ref(), &mut data).await.unwrap();
    assert!(data.has_id());
    assert_eq!(data.get_i64("linode_id"), Some(0));
    assert_eq!(data.get_i64("size"), Some(20));
    assert_eq!(data.get_str("status"), Some("active"));

    let mut attached = change(
        &data,
        json!({"label": "v1", "region": "us-west", "linode_id": instance_id}),
    );
    volume.update(api.client.as_ref(), &mut attached).await.unwrap();
    assert_eq!(attached.get_i64("linode_id"), Some(instance_id));
    assert_eq!(api.fake.calls("attach_volume"), 1);
    assert_eq!(api.fake.calls("detach_volume"), 0);

    let mut detached = change(&attached, json!({"label": "v1", "region": "us-west"}));
    volume.update(api.client.as_ref(), &mut detached).await.unwrap();
    assert_eq!(detached.get_i64("linode_id"), Some(0));
    assert_eq!(api.fake.calls("detach_volume"), 1);

    let id = detached.numeric_id().unwrap();
    assert_eq!(api.fake.volume(id).unwrap().linode_id, None);
}

#[tokio::test(start_paused = true)]
async fn test_volume_reattach_to_other_instance() {
    let api = TestApi::new();
    let volume = VolumeResource::new();
    let first = api.fake.add_instance("a", "us-west");
    let second = api.fake.add_instance("b", "us-west");

    let mut data = desired(
        "volume",
        json!({"label": "v1", "region": "us-west", "linode_id": first}),
    );
    volume.create(api.client.as_ref(), &mut data).await.unwrap();
    assert_eq!(data.get_i64("linode_id"), Some(first));

    let mut moved = change(
        &data,
        json!({"label": "v1", "region": "us-west", "linode_id": second}),
    );
    volume.update(api.client.as_ref(), &mut moved).await.unwrap();

    assert_eq!(moved.get_i64("linode_id"), Some(second));
    assert_eq!(api.fake.calls("detach_volume"), 1);
    assert_eq!(api.fake.calls("attach_volume"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_label_update_does_not_touch_attachment() {
    let api = TestApi::new();
    let volume = VolumeResource::new();
    let instance_id = api.fake.add_instance("web", "us-west");

    let mut data = desired(
        "volume",
        json!({"label": "v1", "region": "us-west", "linode_id": instance_id}),
    );
    volume.create(api.client.as_ref(), &mut data).await.unwrap();

    let mut renamed = change(
        &data,
        json!({"label": "v2", "region": "us-west", "linode_id": instance_id}),
    );
    volume.update(api.client.as_ref(), &mut renamed).await.unwrap();

    assert_eq!(renamed.get_str("label"), Some("v2"));
    assert_eq!(renamed.get_i64("linode_id"), Some(instance_id));
    assert_eq!(api.fake.calls("update_volume"), 1);
    assert_eq!(api.fake.calls("attach_volume"), 0);
    assert_eq!(api.fake.calls("detach_volume"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_volume_resize_grows_only() {
    let api = TestApi::new();
    let volume = VolumeResource::new();

    let mut data = desired("volume", json!({"label": "v1", "region": "us-west"}));
    volume.create(api.client.as_ref(), &mut data).await.unwrap();

    let mut grown = change(&data, json!({"label": "v1", "region": "us-west", "size": 30}));
    volume.update(api.client.as_ref(), &mut grown).await.unwrap();
    assert_eq!(grown.get_i64("size"), Some(30));
    assert_eq!(api.fake.calls("resize_volume"), 1);

    let mut unset = change(&grown, json!({"label": "v1", "region": "us-west"}));
    volume.update(api.client.as_ref(), &mut unset).await.unwrap();
    assert_eq!(unset.get_i64("size"), Some(30));
    assert_eq!(api.fake.calls("resize_volume"), 1);

    let mut shrunk = change(&grown, json!({"label": "v1", "region": "us-west", "size": 20}));
    let err = volume
        .update(api.client.as_ref(), &mut shrunk)
        .await
        .unwrap_err();
    assert!(matches!(err, CloudError::InvalidConfig(_)));
}

#[tokio::test(start_paused = true)]
async fn test_delete_is_idempotent_and_exists_reports_absence() {
    let api = TestApi::new();
    let volume = VolumeResource::new();
    let instance_id = api.fake.add_instance("web", "us-west");

    let mut data = desired(
        "volume",
        json!({"label": "v1", "region": "us-west", "linode_id": instance_id}),
    );
    volume.create(api.client.as_ref(), &mut data).await.unwrap();
    let id = data.id().to_string();
    assert!(volume.exists(api.client.as_ref(), &data).await.unwrap());

    volume.delete(api.client.as_ref(), &mut data).await.unwrap();
    assert!(!data.has_id());
    assert_eq!(api.fake.calls("detach_volume"), 1);

    let mut gone = ResourceData::from_state("volume", id, Default::default());
    assert!(!volume.exists(api.client.as_ref(), &gone).await.unwrap());
    volume.delete(api.client.as_ref(), &mut gone).await.unwrap();
    assert!(!gone.has_id());
}

#[tokio::test]
async fn test_read_clears_id_of_vanished_volume() {
    let api = TestApi::new();
    let volume = VolumeResource::new();

    let mut data = desired("volume", json!({"label": "v1", "region": "us-west"}));
    volume.create(api.client.as_ref(), &mut data).await.unwrap();
    api.fake.remove_volume(data.numeric_id().unwrap());

    volume.read(api.client.as_ref(), &mut data).await.unwrap();
    assert!(!data.has_id());
}

#[tokio::test]
async fn test_invalid_id_is_surfaced() {
    let api = TestApi::new();
    let volume = VolumeResource::new();
    let data = ResourceData::from_state("volume", "not-a-number", Default::default());

    let err = volume.exists(api.client.as_ref(), &data).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidId { .. }));
}

#[tokio::test]
async fn test_api_errors_are_not_swallowed() {
    let api = TestApi::new();
    let volume = VolumeResource::new();

    let mut data = desired("volume", json!({"label": "v1", "region": "us-west"}));
    volume.create(api.client.as_ref(), &mut data).await.unwrap();

    api.fake.fail_next("get_volume", 500);
    let err = volume.read(api.client.as_ref(), &mut data).await.unwrap_err();
    assert!(matches!(err, CloudError::ApiError(_)));
    assert!(data.has_id());
}
