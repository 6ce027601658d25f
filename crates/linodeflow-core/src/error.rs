use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}\nReason: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown node '{0}' (expected project, provider, sshkey, instance, volume or image)")]
    UnknownNode(String),

    #[error("{0} is declared more than once")]
    Duplicate(String),

    #[error("{resource}: attribute '{attribute}' references '{target}': {reason}")]
    InvalidReference {
        resource: String,
        attribute: String,
        target: String,
        reason: String,
    },

    #[error("Provider '{0}' is not declared")]
    ProviderNotFound(String),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
