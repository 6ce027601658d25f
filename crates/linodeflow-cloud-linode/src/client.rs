//! Linode v4 REST client
//!
//! Bearer token authentication against `https://api.linode.com/v4` (or the
//! URL configured through `LINODE_URL` / the manifest's provider block).

use crate::api::*;
use crate::error::{LinodeError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.linode.com/v4";

/// Connection settings for [`LinodeClient`]
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub token: String,
    pub url: String,
}

impl ProviderConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Create ProviderConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("LINODE_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LinodeError::MissingEnvVar("LINODE_TOKEN".to_string()))?;
        let url = std::env::var("LINODE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self { token, url })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

pub struct LinodeClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, Deserialize)]
struct ErrorReason {
    reason: String,
    field: Option<String>,
}

/// Build an API error from a non-success response body
fn api_error(status: u16, body: &str) -> LinodeError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| {
            envelope
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("[{}] {}", field, e.reason),
                    None => e.reason,
                })
                .collect::<Vec<_>>()
                .join("; ")
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "no response body".to_string()
            } else {
                body.trim().to_string()
            }
        });

    LinodeError::Api { status, message }
}

impl LinodeClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: config.token,
            base_url: config.url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.execute(self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        let response = self.execute(self.client.post(&url).json(body)).await?;
        Ok(response.json().await?)
    }

    /// POST whose response body carries nothing of interest
    async fn post_action<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);
        self.execute(self.client.post(&url).json(body)).await?;
        Ok(())
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("PUT {}", url);
        let response = self.execute(self.client.put(&url).json(body)).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("DELETE {}", url);
        self.execute(self.client.delete(&url)).await?;
        Ok(())
    }
}

#[async_trait]
impl LinodeApi for LinodeClient {
    async fn get_profile(&self) -> Result<Profile> {
        self.get("profile").await
    }

    async fn get_sshkey(&self, id: i64) -> Result<SshKey> {
        self.get(&format!("profile/sshkeys/{}", id)).await
    }

    async fn create_sshkey(&self, opts: &SshKeyCreateOptions) -> Result<SshKey> {
        self.post("profile/sshkeys", opts).await
    }

    async fn update_sshkey(&self, id: i64, opts: &SshKeyUpdateOptions) -> Result<SshKey> {
        self.put(&format!("profile/sshkeys/{}", id), opts).await
    }

    async fn delete_sshkey(&self, id: i64) -> Result<()> {
        self.delete(&format!("profile/sshkeys/{}", id)).await
    }

    async fn get_volume(&self, id: i64) -> Result<Volume> {
        self.get(&format!("volumes/{}", id)).await
    }

    async fn create_volume(&self, opts: &VolumeCreateOptions) -> Result<Volume> {
        self.post("volumes", opts).await
    }

    async fn update_volume(&self, id: i64, opts: &VolumeUpdateOptions) -> Result<Volume> {
        self.put(&format!("volumes/{}", id), opts).await
    }

    async fn delete_volume(&self, id: i64) -> Result<()> {
        self.delete(&format!("volumes/{}", id)).await
    }

    async fn attach_volume(&self, id: i64, opts: &VolumeAttachOptions) -> Result<Volume> {
        self.post(&format!("volumes/{}/attach", id), opts).await
    }

    async fn detach_volume(&self, id: i64) -> Result<()> {
        self.post_action(&format!("volumes/{}/detach", id), &serde_json::json!({}))
            .await
    }

    async fn resize_volume(&self, id: i64, size: i64) -> Result<Volume> {
        self.post(&format!("volumes/{}/resize", id), &serde_json::json!({ "size": size }))
            .await
    }

    async fn get_image(&self, id: &str) -> Result<Image> {
        self.get(&format!("images/{}", id)).await
    }

    async fn create_image(&self, opts: &ImageCreateOptions) -> Result<Image> {
        self.post("images", opts).await
    }

    async fn update_image(&self, id: &str, opts: &ImageUpdateOptions) -> Result<Image> {
        self.put(&format!("images/{}", id), opts).await
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        self.delete(&format!("images/{}", id)).await
    }

    async fn get_instance(&self, id: i64) -> Result<Instance> {
        self.get(&format!("linode/instances/{}", id)).await
    }

    async fn create_instance(&self, opts: &InstanceCreateOptions) -> Result<Instance> {
        self.post("linode/instances", opts).await
    }

    async fn update_instance(&self, id: i64, opts: &InstanceUpdateOptions) -> Result<Instance> {
        self.put(&format!("linode/instances/{}", id), opts).await
    }

    async fn resize_instance(&self, id: i64, instance_type: &str) -> Result<()> {
        self.post_action(
            &format!("linode/instances/{}/resize", id),
            &serde_json::json!({ "type": instance_type }),
        )
        .await
    }

    async fn delete_instance(&self, id: i64) -> Result<()> {
        self.delete(&format!("linode/instances/{}", id)).await
    }

    async fn get_instance_disk(&self, linode_id: i64, disk_id: i64) -> Result<InstanceDisk> {
        self.get(&format!("linode/instances/{}/disks/{}", linode_id, disk_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_api_error_from_envelope() {
        let body = r#"{"errors":[{"reason":"Not found"}]}"#;
        let err = api_error(404, body);
        assert!(err.is_not_found());
        assert!(matches!(err, LinodeError::Api { ref message, .. } if message == "Not found"));
    }

    #[test]
    fn test_api_error_joins_field_reasons() {
        let body = r#"{"errors":[{"field":"label","reason":"too short"},{"reason":"quota exceeded"}]}"#;
        match api_error(400, body) {
            LinodeError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "[label] too short; quota exceeded");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_api_error_plain_body() {
        match api_error(502, "  Bad Gateway \n") {
            LinodeError::Api { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {}", other),
        }
        match api_error(500, "") {
            LinodeError::Api { message, .. } => assert_eq!(message, "no response body"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_url_joining() {
        let client =
            LinodeClient::new(ProviderConfig::new("t").with_url("http://localhost:8080/v4/"));
        assert_eq!(client.base_url(), "http://localhost:8080/v4");
        assert_eq!(client.url("/volumes/1"), "http://localhost:8080/v4/volumes/1");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        temp_env::with_vars(
            [("LINODE_TOKEN", Some("secret")), ("LINODE_URL", None::<&str>)],
            || {
                let config = ProviderConfig::from_env().unwrap();
                assert_eq!(config.token, "secret");
                assert_eq!(config.url, DEFAULT_API_URL);
            },
        );
        temp_env::with_vars(
            [
                ("LINODE_TOKEN", Some("secret")),
                ("LINODE_URL", Some("http://127.0.0.1:9000/v4")),
            ],
            || {
                let config = ProviderConfig::from_env().unwrap();
                assert_eq!(config.url, "http://127.0.0.1:9000/v4");
            },
        );
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        temp_env::with_var_unset("LINODE_TOKEN", || {
            let err = ProviderConfig::from_env().unwrap_err();
            assert!(matches!(err, LinodeError::MissingEnvVar(ref v) if v == "LINODE_TOKEN"));
        });
    }
}
