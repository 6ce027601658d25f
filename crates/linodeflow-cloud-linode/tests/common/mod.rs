use linodeflow_cloud::{Attributes, ResourceData};
use linodeflow_cloud_linode::{FakeLinode, LinodeApi};
use serde_json::Value;
use std::sync::Arc;

pub struct TestApi {
    pub fake: Arc<FakeLinode>,
    pub client: Arc<dyn LinodeApi>,
}

impl TestApi {
    pub fn new() -> Self {
        let fake = Arc::new(FakeLinode::new());
        let client: Arc<dyn LinodeApi> = fake.clone();
        Self { fake, client }
    }
}

pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        other => panic!("expected an object, got {}", other),
    }
}

/// Data for a resource about to be created
#[allow(dead_code)]
pub fn desired(resource_type: &str, config: Value) -> ResourceData {
    ResourceData::from_config(resource_type, attrs(config))
}

/// Data for an update: the recorded state of `current` plus a new config
#[allow(dead_code)]
pub fn change(current: &ResourceData, config: Value) -> ResourceData {
    ResourceData::from_state(current.resource_type(), current.id(), current.state().clone())
        .with_config(attrs(config))
}
