use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_cloud::CloudProvider;
use linodeflow_cloud_linode::PROVIDER_NAME;

pub async fn handle(project: &Project, target: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let provider = utils::build_provider(&project.manifest)?;
    let (manager, lock, mut state) = project.lock_state().await?;

    match target {
        Some(target) => {
            let key = utils::resolve_key(target)?;
            if state.get_resource(&key).is_none() {
                anyhow::bail!("{} is not in the state", key);
            }

            println!("  {} {}", "-".red(), key.red().bold());
            if !utils::confirmed(yes, &format!("delete {}", key)) {
                lock.release().await?;
                return Ok(());
            }

            let result = provider.destroy(&key, &mut state).await;
            manager.save(&state).await?;
            lock.release().await?;
            result?;

            println!("{}", format!("✓ Destroyed {}", key).green().bold());
        }
        None => {
            let keys: Vec<String> = state
                .get_provider_resources(PROVIDER_NAME)
                .into_iter()
                .map(|(key, _)| key.clone())
                .collect();
            if keys.is_empty() {
                println!("{}", "No managed resources".dimmed());
                lock.release().await?;
                return Ok(());
            }

            for key in &keys {
                println!("  {} {}", "-".red(), key.red().bold());
            }
            if !utils::confirmed(yes, &format!("delete {} resource(s)", keys.len())) {
                lock.release().await?;
                return Ok(());
            }

            let result = provider.destroy_all(&mut state).await;
            manager.save(&state).await?;
            lock.release().await?;
            let result = result?;

            utils::print_apply_result(&result);
            if !result.is_success() {
                anyhow::bail!("{} resource(s) could not be destroyed", result.failed.len());
            }
            println!("{}", "✓ Destroy complete".green().bold());
        }
    }

    Ok(())
}
