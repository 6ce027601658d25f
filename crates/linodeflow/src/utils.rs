use colored::Colorize;
use linodeflow_cloud::{
    ActionType, ApplyResult, Attributes, CloudProvider, GlobalState, Plan, ResourceSet,
    StateLock, StateManager, split_state_key, state_key,
};
use linodeflow_cloud_linode::{LinodeProvider, PROVIDER_NAME, ProviderConfig};
use linodeflow_core::Manifest;
use std::path::PathBuf;

/// A loaded manifest and where its state lives
pub struct Project {
    pub manifest_path: PathBuf,
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl Project {
    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.root)
    }

    /// Lock the state file and load it
    pub async fn lock_state(&self) -> anyhow::Result<(StateManager, StateLock, GlobalState)> {
        let manager = self.state_manager();
        let lock = manager.acquire_lock().await?;
        let state = manager.load().await?;
        Ok((manager, lock, state))
    }
}

/// Find and parse the manifest
pub fn load_project(file: Option<PathBuf>) -> anyhow::Result<Project> {
    let manifest_path = match file {
        Some(path) => path,
        None => linodeflow_config::find_manifest_file()?,
    };
    let root = linodeflow_config::project_root(&manifest_path);
    let manifest = linodeflow_core::parse_manifest_file(&manifest_path)?;

    tracing::debug!(
        "Loaded manifest {} (project root {})",
        manifest_path.display(),
        root.display()
    );

    Ok(Project {
        manifest_path,
        root,
        manifest,
    })
}

/// Provider for API work. Credentials come from `LINODE_TOKEN`; the
/// manifest's `provider "linode"` block may override the URL.
pub fn build_provider(manifest: &Manifest) -> anyhow::Result<LinodeProvider> {
    ensure_supported_providers(manifest)?;

    let mut config = ProviderConfig::from_env()?;
    if let Some(url) = manifest.provider(PROVIDER_NAME).and_then(|p| p.url.as_ref()) {
        config = config.with_url(url);
    }

    Ok(LinodeProvider::new(config))
}

/// Provider used only for its schemas; never makes API calls
pub fn schema_provider() -> LinodeProvider {
    LinodeProvider::new(ProviderConfig::new(String::new()))
}

fn ensure_supported_providers(manifest: &Manifest) -> anyhow::Result<()> {
    if let Some(resource) = manifest
        .resources
        .iter()
        .find(|r| r.provider != PROVIDER_NAME)
    {
        anyhow::bail!(
            "{}: provider '{}' is not supported (only '{}')",
            resource.key(),
            resource.provider,
            PROVIDER_NAME
        );
    }
    Ok(())
}

/// Accept `type.name`, `type:name` or a full `provider:type:name` state key
pub fn resolve_key(key: &str) -> anyhow::Result<String> {
    if split_state_key(key).is_some() {
        return Ok(key.to_string());
    }

    key.split_once('.')
        .or_else(|| key.split_once(':'))
        .filter(|(t, n)| !t.is_empty() && !n.is_empty())
        .map(|(resource_type, name)| state_key(PROVIDER_NAME, resource_type, name))
        .ok_or_else(|| anyhow::anyhow!("Invalid resource key '{}' (expected TYPE.NAME)", key))
}

/// Attributes with sensitive fields masked
pub fn masked_attributes(
    provider: &LinodeProvider,
    resource_type: &str,
    attributes: &Attributes,
) -> serde_json::Map<String, serde_json::Value> {
    let schema = provider.schema(resource_type);
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();

    keys.into_iter()
        .map(|key| {
            let sensitive = schema
                .and_then(|s| s.field(key))
                .is_some_and(|f| f.sensitive);
            let value = if sensitive {
                serde_json::Value::String("(sensitive)".to_string())
            } else {
                attributes[key].clone()
            };
            (key.clone(), value)
        })
        .collect()
}

pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let (symbol, label) = match action.action_type {
            ActionType::Create => ("+".green(), action.resource_id.green()),
            ActionType::Update => ("~".yellow(), action.resource_id.yellow()),
            ActionType::Replace => ("±".magenta(), action.resource_id.magenta()),
            ActionType::Delete => ("-".red(), action.resource_id.red()),
            ActionType::NoOp => continue,
        };
        println!(
            "  {} {} {}",
            symbol,
            action.resource_type.dimmed(),
            label.bold()
        );
        if !action.changed.is_empty() {
            println!("      {}", action.changed.join(", ").dimmed());
        }
    }

    println!();
    println!("Plan: {}", plan.summary());
}

pub fn print_apply_result(result: &ApplyResult) {
    for succeeded in &result.succeeded {
        println!("  {} {}", "✓".green(), succeeded.message);
    }
    for failed in &result.failed {
        eprintln!(
            "  {} {}: {}",
            "✗".red(),
            failed.action_id,
            failed.message
        );
    }

    println!();
    println!(
        "{} succeeded, {} failed ({} ms)",
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms
    );
}

/// Ask for `--yes` before a destructive run
pub fn confirmed(yes: bool, what: &str) -> bool {
    if !yes {
        println!();
        println!("{}", format!("This will {}.", what).yellow());
        println!("Run again with --yes to continue");
    }
    yes
}

/// Common validation used by every provider-backed command
pub fn validate_manifest(
    provider: &impl CloudProvider,
    manifest: &Manifest,
) -> anyhow::Result<ResourceSet> {
    let desired = manifest.to_resource_set();
    provider.validate(&desired)?;
    Ok(desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linodeflow_core::parse_manifest_str;

    #[test]
    fn test_resolve_key() {
        assert_eq!(resolve_key("volume.data").unwrap(), "linode:volume:data");
        assert_eq!(resolve_key("volume:data").unwrap(), "linode:volume:data");
        assert_eq!(
            resolve_key("linode:volume:data").unwrap(),
            "linode:volume:data"
        );
        assert!(resolve_key("volume").is_err());
        assert!(resolve_key(".data").is_err());
    }

    #[test]
    fn test_masked_attributes() {
        let provider = schema_provider();
        let mut attributes = Attributes::new();
        attributes.insert("label".to_string(), serde_json::json!("web-1"));
        attributes.insert("root_pass".to_string(), serde_json::json!("hunter2"));

        let masked = masked_attributes(&provider, "instance", &attributes);
        assert_eq!(masked["label"], "web-1");
        assert_eq!(masked["root_pass"], "(sensitive)");
    }

    #[test]
    fn test_unsupported_provider() {
        let manifest = parse_manifest_str(
            r#"
            provider "aws" {}
            sshkey "k" { provider "aws"; label "k"; ssh_key "ssh-rsa AAAA" }
            "#,
            "demo".to_string(),
        )
        .unwrap();

        let err = ensure_supported_providers(&manifest).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_validate_manifest() {
        let manifest = parse_manifest_str(
            r#"
            instance "web" { label "web-1"; region "us-west"; type "g6-nanode-1" }
            volume "data" { label "v1"; region "us-west"; linode_id ref="instance.web" }
            "#,
            "demo".to_string(),
        )
        .unwrap();

        let desired = validate_manifest(&schema_provider(), &manifest).unwrap();
        assert_eq!(desired.len(), 2);
    }

    #[test]
    fn test_validate_manifest_missing_required() {
        let manifest =
            parse_manifest_str(r#"volume "data" { label "v1" }"#, "demo".to_string()).unwrap();

        assert!(validate_manifest(&schema_provider(), &manifest).is_err());
    }
}
