//! Linode provider error types

use linodeflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinodeError {
    #[error("Linode API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] CloudError),
}

impl LinodeError {
    /// A 404 answer for the given entity
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Api {
            status: 404,
            message: format!("{} not found", what),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the API confirmed that the entity does not exist
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<LinodeError> for CloudError {
    fn from(e: LinodeError) -> Self {
        match e {
            LinodeError::CloudError(inner) => inner,
            e if e.is_not_found() => CloudError::ResourceNotFound(e.to_string()),
            LinodeError::MissingEnvVar(var) => {
                CloudError::InvalidConfig(format!("environment variable {} is not set", var))
            }
            e => CloudError::ApiError(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let err = LinodeError::not_found("volume 7");
        assert!(err.is_not_found());
        assert!(matches!(CloudError::from(err), CloudError::ResourceNotFound(_)));
    }

    #[test]
    fn test_other_status_maps_to_api_error() {
        let err = LinodeError::Api {
            status: 400,
            message: "size: must be at least 10".to_string(),
        };
        assert!(!err.is_not_found());
        let cloud: CloudError = err.into();
        assert!(matches!(cloud, CloudError::ApiError(ref m) if m.contains("400")));
    }

    #[test]
    fn test_cloud_error_passes_through() {
        let err = LinodeError::from(CloudError::Timeout("disk 1".to_string()));
        assert!(matches!(CloudError::from(err), CloudError::Timeout(_)));
    }
}
