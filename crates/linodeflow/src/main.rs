mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linodeflow")]
#[command(about = "Declare Linode resources in KDL. Plan, apply, refresh.", long_about = None)]
struct Cli {
    /// Manifest file (default: search for linode.kdl)
    #[arg(short = 'f', long = "file", global = true)]
    file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would change
    Plan,
    /// Create, update and delete resources to match the manifest
    Apply {
        /// Run without confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete managed resources
    Destroy {
        /// Run without confirmation
        #[arg(short, long)]
        yes: bool,
        /// Only this resource (`volume.data` or `linode:volume:data`)
        #[arg(long)]
        target: Option<String>,
    },
    /// Re-read tracked resources and report drift
    Refresh,
    /// Bring an existing resource under management
    Import {
        /// Resource type (sshkey, instance, volume, image)
        resource_type: String,
        /// Resource name in the manifest
        name: String,
        /// Linode ID of the existing resource
        id: String,
    },
    /// Inspect or edit the state file
    #[command(subcommand)]
    State(StateCommands),
    /// Check the manifest against the resource schemas
    Validate,
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum StateCommands {
    /// List tracked resources
    List,
    /// Show a tracked resource's attributes
    Show {
        /// State key (`volume.data` or `linode:volume:data`)
        key: String,
    },
    /// Stop tracking a resource without deleting it
    Rm {
        /// State key (`volume.data` or `linode:volume:data`)
        key: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Version needs no manifest
    if matches!(cli.command, Commands::Version) {
        println!("linodeflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let project = utils::load_project(cli.file)?;

    match cli.command {
        Commands::Plan => commands::plan::handle(&project).await?,
        Commands::Apply { yes } => commands::apply::handle(&project, yes).await?,
        Commands::Destroy { yes, target } => {
            commands::destroy::handle(&project, target.as_deref(), yes).await?
        }
        Commands::Refresh => commands::refresh::handle(&project).await?,
        Commands::Import {
            resource_type,
            name,
            id,
        } => commands::import::handle(&project, &resource_type, &name, &id).await?,
        Commands::State(state_cmd) => match state_cmd {
            StateCommands::List => commands::state::handle_list(&project).await?,
            StateCommands::Show { key } => commands::state::handle_show(&project, &key).await?,
            StateCommands::Rm { key } => commands::state::handle_rm(&project, &key).await?,
        },
        Commands::Validate => commands::validate::handle(&project)?,
        Commands::Version => unreachable!(),
    }

    Ok(())
}
