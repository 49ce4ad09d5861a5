use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::info;

use crate::api::{AuthMode, Credentials};
use crate::cli::output;
use crate::config::{ClientOptions, Config};

#[derive(Args)]
pub struct EnvCommands {
    #[command(subcommand)]
    pub command: EnvSubcommands,
}

#[derive(Subcommand)]
pub enum EnvSubcommands {
    /// Add or replace an environment
    Add {
        /// Name for this environment (e.g., "production", "test")
        name: String,
        /// CRM base URL, e.g. https://crm.example.com
        #[arg(long)]
        url: String,
        /// CRM user name
        #[arg(long)]
        username: String,
        /// Access key from the user's preferences page
        #[arg(long, conflicts_with = "password", required_unless_present = "password")]
        access_key: Option<String>,
        /// Log in with the user's password instead of an access key
        #[arg(long)]
        password: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Web-service script path relative to the base URL
        #[arg(long)]
        webservice_path: Option<String>,
    },
    /// List configured environments
    List,
    /// Select the current environment
    Use {
        /// Environment name to select
        name: String,
    },
    /// Remove an environment
    Remove {
        /// Environment name to remove
        name: String,
    },
}

pub async fn handle_env_command(args: EnvCommands) -> Result<()> {
    let mut config = Config::load()?;

    match args.command {
        EnvSubcommands::Add {
            name,
            url,
            username,
            access_key,
            password,
            timeout,
            webservice_path,
        } => {
            let (secret, mode) = match (access_key, password) {
                (Some(key), _) => (key, AuthMode::AccessKey),
                (None, Some(password)) => (password, AuthMode::Password),
                (None, None) => anyhow::bail!("Either --access-key or --password is required"),
            };

            let mut options = ClientOptions::new(url, Credentials::new(username, secret)?).with_auth_mode(mode);
            if let Some(timeout) = timeout {
                options = options.with_timeout(timeout);
            }
            if let Some(path) = webservice_path {
                options = options.with_webservice_path(path);
            }

            config.add_environment(name.clone(), options);
            config.save()?;
            output::success(format!("Environment '{}' saved", name));
        }
        EnvSubcommands::List => {
            let environments = config.list_environments();
            if environments.is_empty() {
                println!("No environments configured. Run 'vtiger-cli env add' to create one.");
                return Ok(());
            }

            for name in environments {
                let url = &config.environments[name].base_url;
                if config.current_environment.as_ref() == Some(name) {
                    println!("  ● {} {} {}", name.bright_green().bold(), url.dimmed(), "(current)".dimmed());
                } else {
                    println!("  ○ {} {}", name, url.dimmed());
                }
            }
        }
        EnvSubcommands::Use { name } => {
            config.set_current_environment(&name)?;
            config.save()?;
            output::success(format!("Selected environment: {}", name));
        }
        EnvSubcommands::Remove { name } => {
            info!("Removing environment: {}", name);
            config.remove_environment(&name)?;
            config.save()?;
            output::success(format!("Environment '{}' removed", name));

            if config.current_environment.is_none() {
                println!("No current environment selected. Run 'vtiger-cli env use' to choose one.");
            }
        }
    }

    Ok(())
}
