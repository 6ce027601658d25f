use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Manifest not found. Looked in:\n\
        - current directory: linode.local.kdl, .linode.local.kdl, linode.kdl, .linode.kdl\n\
        - ./.linodeflow/\n\
        - ~/.config/linodeflow/linode.kdl\n\
        Set LINODEFLOW_CONFIG_PATH to use another file"
    )]
    ManifestNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
