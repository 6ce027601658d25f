use crate::utils::{self, Project};
use colored::Colorize;
use linodeflow_core::RESOURCE_TYPES;

pub fn handle(project: &Project) -> anyhow::Result<()> {
    println!("{}", "Validating manifest...".blue());
    println!(
        "Manifest: {}",
        project.manifest_path.display().to_string().cyan()
    );

    let provider = utils::schema_provider();
    if let Err(e) = utils::validate_manifest(&provider, &project.manifest) {
        eprintln!();
        eprintln!("{}", "✗ Invalid manifest".red().bold());
        eprintln!("  {}", e);
        std::process::exit(1);
    }

    println!("{}", "✓ Manifest is valid".green().bold());
    println!();
    println!("Project: {}", project.manifest.name.cyan());
    for resource_type in RESOURCE_TYPES {
        let resources: Vec<_> = project
            .manifest
            .resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect();
        if resources.is_empty() {
            continue;
        }

        println!("  {}: {}", resource_type, resources.len());
        for resource in resources {
            let label = resource
                .attribute("label")
                .and_then(|v| v.as_str())
                .unwrap_or("(no label)");
            println!("    - {} ({})", resource.name.cyan(), label);
        }
    }

    Ok(())
}
