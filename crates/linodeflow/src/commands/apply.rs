use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_cloud::CloudProvider;

pub async fn handle(project: &Project, yes: bool) -> anyhow::Result<()> {
    let provider = utils::build_provider(&project.manifest)?;
    let desired = utils::validate_manifest(&provider, &project.manifest)?;

    let (manager, lock, mut state) = project.lock_state().await?;

    let plan = provider.plan(&desired, &state).await?;
    if !plan.has_changes {
        println!("{}", "✓ No changes. Resources match the manifest.".green());
        lock.release().await?;
        return Ok(());
    }

    utils::print_plan(&plan);
    if !utils::confirmed(yes, "change the resources above") {
        lock.release().await?;
        return Ok(());
    }

    println!();
    println!("{}", "Applying...".blue());

    // State is written even when the run fails part-way
    let result = provider.apply(&plan, &mut state).await;
    manager.save(&state).await?;
    lock.release().await?;
    let result = result?;

    utils::print_apply_result(&result);
    if !result.is_success() {
        anyhow::bail!("{} action(s) failed", result.failed.len());
    }

    println!("{}", "✓ Apply complete".green().bold());
    Ok(())
}
