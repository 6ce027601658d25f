use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_cloud::CloudProvider;

pub async fn handle(project: &Project) -> anyhow::Result<()> {
    println!("{}", "Planning...".blue());
    println!(
        "Manifest: {}",
        project.manifest_path.display().to_string().cyan()
    );

    let provider = utils::build_provider(&project.manifest)?;
    let desired = utils::validate_manifest(&provider, &project.manifest)?;
    let state = project.state_manager().load().await?;

    let plan = provider.plan(&desired, &state).await?;
    println!();
    if !plan.has_changes {
        println!("{}", "✓ No changes. Resources match the manifest.".green());
        return Ok(());
    }

    utils::print_plan(&plan);
    Ok(())
}
