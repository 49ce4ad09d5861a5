use super::commands::env::EnvCommands;
use super::commands::query::QueryArgs;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vtiger-cli")]
#[command(about = "A CLI tool for interacting with the vtiger CRM web service")]
pub struct Cli {
    /// Environment to use instead of the current one
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configured CRM environments
    Env(EnvCommands),
    /// Log in and show the session details
    Login,
    /// List the modules accessible to the user
    Types,
    /// Describe the fields of a module
    Describe {
        /// Module name, e.g. "Leads"
        module: String,
    },
    /// Query records of a module
    Query(QueryArgs),
    /// Retrieve a single record
    Retrieve {
        /// Typed id (e.g. "10x42"), or a numeric id together with --module
        id: String,
        /// Module the numeric id belongs to
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Delete a single record
    Delete {
        /// Typed id (e.g. "10x42"), or a numeric id together with --module
        id: String,
        /// Module the numeric id belongs to
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Show records changed since a point in time
    Sync {
        /// Restrict to one module
        #[arg(short, long)]
        module: Option<String>,
        /// RFC 3339 timestamp or YYYY-MM-DD date (defaults to today, midnight UTC)
        #[arg(short, long)]
        since: Option<String>,
    },
}
