pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// Environment variable naming the manifest directly
pub const CONFIG_PATH_ENV: &str = "LINODEFLOW_CONFIG_PATH";

/// Project-local directory for manifests and state
pub const PROJECT_DIR: &str = ".linodeflow";

/// Manifest file names, highest priority first
pub const MANIFEST_CANDIDATES: [&str; 4] = [
    "linode.local.kdl",
    ".linode.local.kdl",
    "linode.kdl",
    ".linode.kdl",
];

/// Global linodeflow config directory (`~/.config/linodeflow`), created on demand
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("linodeflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the project's manifest.
///
/// Search order:
/// 1. `LINODEFLOW_CONFIG_PATH`
/// 2. current directory: linode.local.kdl, .linode.local.kdl, linode.kdl, .linode.kdl
/// 3. `./.linodeflow/`, same order
/// 4. `~/.config/linodeflow/linode.kdl`
pub fn find_manifest_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points to {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;

    if let Some(path) = find_in(&current_dir) {
        return Ok(path);
    }

    let project_dir = current_dir.join(PROJECT_DIR);
    if project_dir.is_dir()
        && let Some(path) = find_in(&project_dir)
    {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("linodeflow").join("linode.kdl");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Directory that holds `.linodeflow/state.json` for a manifest. A manifest
/// kept inside `.linodeflow/` belongs to the directory above it.
pub fn project_root(manifest: &Path) -> PathBuf {
    let parent = manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    match parent.file_name() {
        Some(name) if name == PROJECT_DIR => parent
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
        _ => parent.to_path_buf(),
    }
}
