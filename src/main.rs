use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kastrack::core::log::init_logging;
use std::path::PathBuf;

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

impl From<Commands> for kastrack::AppCommand {
    fn from(cmd: Commands) -> kastrack::AppCommand {
        match cmd {
            Commands::Summary => kastrack::AppCommand::Summary,
            Commands::History => kastrack::AppCommand::History,
            Commands::Export { output } => kastrack::AppCommand::Export { output },
            Commands::Reset => kastrack::AppCommand::Reset,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display wallet balance, value and profit/loss
    Summary,
    /// Display the day-by-day portfolio value table
    History,
    /// Write the transaction report as CSV
    Export {
        /// Destination file
        #[arg(short, long, default_value = "kaspa_report.csv")]
        output: PathBuf,
    },
    /// Clear the local price database
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => kastrack::cli::setup::setup(),
        Some(cmd) => kastrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
