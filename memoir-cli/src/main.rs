//! memoir CLI entry point.

use clap::{Parser, Subcommand};
use memoir_cli::scaffold::{self, NewArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memoir", version, about = "Project scaffolding for memoir-cached scripts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new scratch project wired up with the memoir cache.
    New(NewArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::New(args) => {
            let outcome = scaffold::scaffold(&args)?;
            if args.edit {
                scaffold::open_editor(&outcome.project_dir)?;
            }
            scaffold::print_next_steps(&outcome);
        }
    }
    Ok(())
}
