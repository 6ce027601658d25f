mod common;

use common::{TestApi, change, desired};
use linodeflow_cloud::{CloudError, Resource, ResourceData};
use linodeflow_cloud_linode::SshKeyResource;
use serde_json::json;

const KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGx0ZXN0a2V5 deploy@example";

#[tokio::test]
async fn test_create_then_read_round_trip() {
    let api = TestApi::new();
    let sshkey = SshKeyResource::new();

    let mut data = desired("sshkey", json!({"label": "deploy", "ssh_key": KEY}));
    sshkey.create(api.client.as_ref(), &mut data).await.unwrap();
    let id = data.numeric_id().unwrap();

    let mut fresh = ResourceData::from_state("sshkey", id.to_string(), Default::default());
    sshkey.read(api.client.as_ref(), &mut fresh).await.unwrap();

    assert_eq!(fresh.get_str("label"), Some("deploy"));
    assert_eq!(fresh.get_str("ssh_key"), Some(KEY));
    assert_eq!(fresh.get_str("created"), Some("2018-01-01T00:01:01Z"));
}

#[tokio::test]
async fn test_update_only_sends_changed_label() {
    let api = TestApi::new();
    let sshkey = SshKeyResource::new();

    let mut data = desired("sshkey", json!({"label": "deploy", "ssh_key": KEY}));
    sshkey.create(api.client.as_ref(), &mut data).await.unwrap();

    let mut same = change(&data, json!({"label": "deploy", "ssh_key": KEY}));
    sshkey.update(api.client.as_ref(), &mut same).await.unwrap();
    assert_eq!(api.fake.calls("update_sshkey"), 0);

    let mut renamed = change(&data, json!({"label": "ci", "ssh_key": KEY}));
    sshkey.update(api.client.as_ref(), &mut renamed).await.unwrap();
    assert_eq!(api.fake.calls("update_sshkey"), 1);
    assert_eq!(api.fake.sshkey(renamed.numeric_id().unwrap()).unwrap().label, "ci");
}

#[tokio::test]
async fn test_rejected_key_leaves_no_id() {
    let api = TestApi::new();
    let sshkey = SshKeyResource::new();

    let mut data = desired("sshkey", json!({"label": "deploy", "ssh_key": "not a key"}));
    let err = sshkey
        .create(api.client.as_ref(), &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, CloudError::ApiError(ref m) if m.contains("400")));
    assert!(!data.has_id());
}

#[tokio::test]
async fn test_delete_twice_succeeds() {
    let api = TestApi::new();
    let sshkey = SshKeyResource::new();

    let mut data = desired("sshkey", json!({"label": "deploy", "ssh_key": KEY}));
    sshkey.create(api.client.as_ref(), &mut data).await.unwrap();
    let mut again = data.clone();

    sshkey.delete(api.client.as_ref(), &mut data).await.unwrap();
    assert!(!sshkey.exists(api.client.as_ref(), &again).await.unwrap());
    sshkey.delete(api.client.as_ref(), &mut again).await.unwrap();
    assert!(!again.has_id());
}

#[tokio::test]
async fn test_create_fails_when_key_is_gone_on_read_back() {
    let api = TestApi::new();
    let sshkey = SshKeyResource::new();
    api.fake.fail_next("get_sshkey", 404);

    let mut data = desired("sshkey", json!({"label": "deploy", "ssh_key": KEY}));
    let err = sshkey
        .create(api.client.as_ref(), &mut data)
        .await
        .unwrap_err();

    assert!(matches!(err, CloudError::CreationFailed(ref m) if m.contains("sshkey")));
    assert!(!data.has_id());
}
