mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::migrate;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "File-based SQL schema migrations")]
#[command(version)]
struct Cli {
    /// Migrations directory (overrides MIGRATIONS_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Database URL, e.g. sqlite:app.db (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new up/down migration pair
    Make {
        /// Migration name, e.g. create_users_table or alter_users_table
        name: String,
    },

    /// Run pending migrations
    Up,

    /// Rollback the last batch of migrations
    Down,

    /// Rollback every applied migration
    Reset,

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::from_env()?.with_overrides(cli.dir, cli.database_url);
    logging::init_logging(&config.log_level, config.json_logs())?;

    match cli.command {
        Commands::Make { name } => {
            migrate::make(&config, &name)?;
        }
        Commands::Up => {
            migrate::up(&config).await?;
        }
        Commands::Down => {
            migrate::down(&config).await?;
        }
        Commands::Reset => {
            migrate::reset(&config).await?;
        }
        Commands::Status { json } => {
            migrate::status(&config, json).await?;
        }
    }

    Ok(())
}
