use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_cloud::{CloudProvider, state_key};
use linodeflow_cloud_linode::PROVIDER_NAME;

pub async fn handle(
    project: &Project,
    resource_type: &str,
    name: &str,
    id: &str,
) -> anyhow::Result<()> {
    let provider = utils::build_provider(&project.manifest)?;

    if project.manifest.resource(resource_type, name).is_none() {
        println!(
            "{}",
            format!(
                "⚠ {} \"{}\" is not declared in the manifest; the next apply will delete it",
                resource_type, name
            )
            .yellow()
        );
    }

    let (manager, lock, mut state) = project.lock_state().await?;
    let result = provider.import(resource_type, name, id, &mut state).await;
    manager.save(&state).await?;
    lock.release().await?;
    result?;

    println!(
        "{}",
        format!(
            "✓ Imported {} (ID {})",
            state_key(PROVIDER_NAME, resource_type, name),
            id
        )
        .green()
        .bold()
    );
    Ok(())
}
