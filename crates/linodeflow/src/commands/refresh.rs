use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_cloud::CloudProvider;

pub async fn handle(project: &Project) -> anyhow::Result<()> {
    println!("{}", "Refreshing state...".blue());

    let provider = utils::build_provider(&project.manifest)?;
    let (manager, lock, mut state) = project.lock_state().await?;

    let reports = provider.refresh(&mut state).await;
    manager.save(&state).await?;
    lock.release().await?;
    let reports = reports?;

    if reports.is_empty() {
        println!("{}", "✓ No drift".green());
        return Ok(());
    }

    for report in &reports {
        if report.vanished {
            println!(
                "  {} {} {}",
                "-".red(),
                report.key.red().bold(),
                "(deleted outside linodeflow, removed from state)".dimmed()
            );
            continue;
        }

        println!("  {} {}", "~".yellow(), report.key.yellow().bold());
        for field in &report.modified {
            println!("      modified: {}", field);
        }
        for field in &report.added {
            println!("      added: {}", field);
        }
        for field in &report.removed {
            println!("      removed: {}", field);
        }
    }

    println!();
    println!("{} resource(s) drifted", reports.len());
    Ok(())
}
