use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use metalrates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for metalrates::AppCommand {
    fn from(cmd: Commands) -> metalrates::AppCommand {
        match cmd {
            Commands::Rates { json } => metalrates::AppCommand::Rates { json },
            Commands::Status => metalrates::AppCommand::Status,
            Commands::ClearCache => metalrates::AppCommand::ClearCache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current gold and silver rates
    Rates {
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display API usage and the update schedule
    Status,
    /// Drop the cached rates
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => metalrates::cli::setup::setup(),
        Some(cmd) => metalrates::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
