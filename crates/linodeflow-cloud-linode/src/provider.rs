//! Linode provider implementation

use crate::api::LinodeApi;
use crate::client::{LinodeClient, ProviderConfig};
use crate::resources::{Client, ImageResource, InstanceResource, SshKeyResource, VolumeResource};
use async_trait::async_trait;
use linodeflow_cloud::{
    ApplyResult, AuthStatus, CloudProvider, DriftReport, GlobalState, Plan, Reconciler,
    ResourceSet, Result, Schema, WaitConfig,
};
use std::sync::Arc;

pub const PROVIDER_NAME: &str = "linode";

/// Linode provider
///
/// Registers the controllers for `sshkey`, `instance`, `volume` and `image`
/// and delegates lifecycle work to the generic [`Reconciler`].
pub struct LinodeProvider {
    reconciler: Reconciler<Client>,
}

impl LinodeProvider {
    /// Provider talking to the Linode API over HTTP
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(Arc::new(LinodeClient::new(config)))
    }

    /// Provider over any client implementation
    pub fn with_client(client: Arc<dyn LinodeApi>) -> Self {
        Self::with_wait_config(client, WaitConfig::default())
    }

    /// Provider with custom readiness polling
    pub fn with_wait_config(client: Arc<dyn LinodeApi>, wait: WaitConfig) -> Self {
        let reconciler = Reconciler::new(PROVIDER_NAME, client)
            .register(SshKeyResource::new())
            .register(InstanceResource::new().with_wait_config(wait.clone()))
            .register(VolumeResource::new().with_wait_config(wait.clone()))
            .register(ImageResource::new().with_wait_config(wait));
        Self { reconciler }
    }

    pub fn reconciler(&self) -> &Reconciler<Client> {
        &self.reconciler
    }

    /// Schema of a supported resource type
    pub fn schema(&self, resource_type: &str) -> Option<&Schema> {
        self.reconciler
            .controller(resource_type)
            .ok()
            .map(|c| c.schema())
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        self.reconciler.resource_types().collect()
    }
}

#[async_trait]
impl CloudProvider for LinodeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &str {
        "Linode"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        match self.reconciler.client().get_profile().await {
            Ok(profile) => Ok(AuthStatus::ok(if profile.email.is_empty() {
                profile.username
            } else {
                format!("{} ({})", profile.username, profile.email)
            })),
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }

    fn validate(&self, desired: &ResourceSet) -> Result<()> {
        self.reconciler.validate(desired)
    }

    async fn refresh(&self, state: &mut GlobalState) -> Result<Vec<DriftReport>> {
        self.reconciler.refresh(state).await
    }

    async fn plan(&self, desired: &ResourceSet, state: &GlobalState) -> Result<Plan> {
        self.reconciler.plan(desired, state)
    }

    async fn apply(&self, plan: &Plan, state: &mut GlobalState) -> Result<ApplyResult> {
        self.reconciler.apply(plan, state).await
    }

    async fn import(
        &self,
        resource_type: &str,
        name: &str,
        id: &str,
        state: &mut GlobalState,
    ) -> Result<()> {
        self.reconciler.import(resource_type, name, id, state).await
    }

    async fn destroy(&self, key: &str, state: &mut GlobalState) -> Result<()> {
        self.reconciler.destroy(key, state).await
    }

    async fn destroy_all(&self, state: &mut GlobalState) -> Result<ApplyResult> {
        self.reconciler.destroy_all(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeLinode;

    #[test]
    fn test_provider_registers_all_types() {
        let provider = LinodeProvider::with_client(Arc::new(FakeLinode::new()));
        let mut types = provider.resource_types();
        types.sort();
        assert_eq!(types, vec!["image", "instance", "sshkey", "volume"]);
        assert!(provider.schema("volume").is_some());
        assert!(provider.schema("bucket").is_none());
    }

    #[tokio::test]
    async fn test_check_auth() {
        let fake = Arc::new(FakeLinode::new());
        let provider = LinodeProvider::with_client(fake.clone());
        let status = provider.check_auth().await.unwrap();
        assert!(status.authenticated);
        assert_eq!(status.account_info.as_deref(), Some("fake (fake@example.com)"));

        fake.fail_next("get_profile", 401);
        let status = provider.check_auth().await.unwrap();
        assert!(!status.authenticated);
        assert!(status.error.unwrap().contains("401"));
    }
}
