use crate::utils::{self, Project};
use colored::Colorize;

pub async fn handle_list(project: &Project) -> anyhow::Result<()> {
    let state = project.state_manager().load().await?;

    if state.resources.is_empty() {
        println!("{}", "No tracked resources".dimmed());
        return Ok(());
    }

    println!(
        "{:<40} {:<12} {:<12} {}",
        "KEY".bold(),
        "ID".bold(),
        "STATUS".bold(),
        "UPDATED".bold()
    );
    println!("{}", "─".repeat(90).dimmed());
    for (key, resource) in &state.resources {
        println!(
            "{:<40} {:<12} {:<12} {}",
            key.cyan(),
            resource.id,
            resource.status.to_string(),
            resource.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

pub async fn handle_show(project: &Project, key: &str) -> anyhow::Result<()> {
    let key = utils::resolve_key(key)?;
    let state = project.state_manager().load().await?;
    let resource = state
        .get_resource(&key)
        .ok_or_else(|| anyhow::anyhow!("{} is not in the state", key))?;

    let provider = utils::schema_provider();
    let attributes =
        utils::masked_attributes(&provider, &resource.resource_type, &resource.attributes);

    println!("{}", key.cyan().bold());
    println!("  id: {}", resource.id);
    println!("  type: {}", resource.resource_type);
    println!("  status: {}", resource.status);
    println!("  created: {}", resource.created_at.to_rfc3339());
    println!("  updated: {}", resource.updated_at.to_rfc3339());
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(attributes))?
    );

    Ok(())
}

pub async fn handle_rm(project: &Project, key: &str) -> anyhow::Result<()> {
    let key = utils::resolve_key(key)?;
    let (manager, lock, mut state) = project.lock_state().await?;

    let Some(removed) = state.remove_resource(&key) else {
        lock.release().await?;
        anyhow::bail!("{} is not in the state", key);
    };

    manager.save(&state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!("✓ Removed {} (ID {}) from state", key, removed.id).green()
    );
    println!("{}", "The resource itself was not deleted at Linode".dimmed());
    Ok(())
}
