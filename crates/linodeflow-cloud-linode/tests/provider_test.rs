mod common;

use common::TestApi;
use linodeflow_cloud::{
    ActionType, CloudProvider, GlobalState, ResourceConfig, ResourceSet, StateManager,
};
use linodeflow_cloud_linode::LinodeProvider;
use serde_json::json;

fn manifest(attach: bool) -> ResourceSet {
    let mut set = ResourceSet::new();
    set.add(ResourceConfig::new(
        "instance",
        "web",
        "linode",
        json!({
            "label": "web-1",
            "region": "us-west",
            "type": "g6-nanode-1",
            "image": "linode/debian12",
            "authorized_keys": ["ssh-ed25519 AAAA deploy"]
        }),
    ));
    let volume = ResourceConfig::new(
        "volume",
        "data",
        "linode",
        json!({"label": "v1", "region": "us-west"}),
    );
    set.add(if attach {
        volume.with_reference("linode_id", "instance:web")
    } else {
        volume
    });
    set
}

#[tokio::test(start_paused = true)]
async fn test_apply_resolves_references_and_detaches() {
    let api = TestApi::new();
    let provider = LinodeProvider::with_client(api.client.clone());
    let mut state = GlobalState::new();

    let plan = provider.plan(&manifest(true), &state).await.unwrap();
    assert_eq!(plan.summary().create, 2);
    assert_eq!(plan.actions[0].resource_type, "instance");

    let result = provider.apply(&plan, &mut state).await.unwrap();
    assert!(result.is_success(), "{:?}", result.failed);

    let instance_id: i64 = state
        .get_resource("linode:instance:web")
        .unwrap()
        .id
        .parse()
        .unwrap();
    let volume = state.get_resource("linode:volume:data").unwrap();
    assert_eq!(volume.get_attribute::<i64>("linode_id"), Some(instance_id));

    let again = provider.plan(&manifest(true), &state).await.unwrap();
    assert!(!again.has_changes);

    let plan = provider.plan(&manifest(false), &state).await.unwrap();
    let action = plan.action_for("linode:volume:data").unwrap();
    assert_eq!(action.action_type, ActionType::Update);
    assert_eq!(action.changed, vec!["linode_id"]);

    provider.apply(&plan, &mut state).await.unwrap();
    let volume = state.get_resource("linode:volume:data").unwrap();
    assert_eq!(volume.get_attribute::<i64>("linode_id"), Some(0));
    assert_eq!(api.fake.calls("detach_volume"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_region_change_replaces_volume() {
    let api = TestApi::new();
    let provider = LinodeProvider::with_client(api.client.clone());
    let mut state = GlobalState::new();

    provider
        .apply(&provider.plan(&manifest(false), &state).await.unwrap(), &mut state)
        .await
        .unwrap();
    let old_id = state.get_resource("linode:volume:data").unwrap().id.clone();

    let mut moved = manifest(false);
    moved.add(ResourceConfig::new(
        "volume",
        "data",
        "linode",
        json!({"label": "v1", "region": "eu-central"}),
    ));
    let plan = provider.plan(&moved, &state).await.unwrap();
    assert_eq!(
        plan.action_for("linode:volume:data").unwrap().action_type,
        ActionType::Replace
    );

    provider.apply(&plan, &mut state).await.unwrap();
    let volume = state.get_resource("linode:volume:data").unwrap();
    assert_ne!(volume.id, old_id);
    assert_eq!(volume.get_attribute::<String>("region").as_deref(), Some("eu-central"));
    assert!(api.fake.volume(old_id.parse().unwrap()).is_none());
}

#[tokio::test]
async fn test_refresh_and_destroy_all_with_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let manager = StateManager::new(dir.path());
    let api = TestApi::new();
    let provider = LinodeProvider::with_client(api.client.clone());

    let mut state = manager.load().await.unwrap();
    let plan = provider.plan(&manifest(true), &state).await.unwrap();
    provider.apply(&plan, &mut state).await.unwrap();
    manager.save(&state).await.unwrap();

    let mut state = manager.load().await.unwrap();
    let volume_id: i64 = state
        .get_resource("linode:volume:data")
        .unwrap()
        .id
        .parse()
        .unwrap();
    api.fake.set_volume_label(volume_id, "renamed");

    let reports = provider.refresh(&mut state).await.unwrap();
    assert_eq!(reports.len(), 1, "{:?}", reports);
    let report = reports
        .iter()
        .find(|r| r.key == "linode:volume:data")
        .unwrap();
    assert_eq!(report.modified, vec!["label"]);

    let result = provider.destroy_all(&mut state).await.unwrap();
    assert!(result.is_success(), "{:?}", result.failed);
    assert!(state.resources.is_empty());
    assert!(api.fake.volume(volume_id).is_none());
}

#[tokio::test]
async fn test_validate_rejects_bad_manifest() {
    let api = TestApi::new();
    let provider = LinodeProvider::with_client(api.client.clone());

    let mut set = ResourceSet::new();
    set.add(ResourceConfig::new(
        "volume",
        "data",
        "linode",
        json!({"label": "v1", "region": "us-west", "status": "active", "size": "big"}),
    ));
    let err = provider.validate(&set).unwrap_err().to_string();
    assert!(err.contains("'status' is computed"), "{}", err);
    assert!(err.contains("'size' must be"), "{}", err);
}
