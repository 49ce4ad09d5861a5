use anyhow::Result;
use clap::Parser;
use log::info;

use vtiger_cli::cli::commands::{
    delete_command, describe_command, handle_env_command, handle_query_command, login_command, retrieve_command,
    sync_command, types_command,
};
use vtiger_cli::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("vtiger-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting vtiger-cli");

    let env = cli.env.as_deref();
    match cli.command {
        Commands::Env(args) => handle_env_command(args).await,
        Commands::Login => login_command(env).await,
        Commands::Types => types_command(env).await,
        Commands::Describe { module } => describe_command(env, &module).await,
        Commands::Query(args) => handle_query_command(env, args).await,
        Commands::Retrieve { id, module } => retrieve_command(env, &id, module.as_deref()).await,
        Commands::Delete { id, module } => delete_command(env, &id, module.as_deref()).await,
        Commands::Sync { module, since } => sync_command(env, module.as_deref(), since.as_deref()).await,
    }
}
