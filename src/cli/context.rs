//! Resolving which CRM instance a command talks to

use anyhow::{Context, Result};
use colored::*;
use log::{debug, info};

use crate::api::VtigerClient;
use crate::config::{ClientOptions, Config};

/// Options for `--env`, else the current environment, else `VTIGER_*` variables
pub fn resolve_options(env: Option<&str>) -> Result<ClientOptions> {
    let config = Config::load()?;

    if let Some(options) = config.resolve(env) {
        debug!("Using configured environment {:?}", env.or(config.current_environment.as_deref()));
        return Ok(options.clone());
    }

    if let Some(name) = env {
        anyhow::bail!("Environment '{}' not found. Run 'vtiger-cli env list' to see configured ones.", name);
    }

    info!("No environment configured, falling back to environment variables");
    ClientOptions::from_env()
        .context("No environment selected. Run 'vtiger-cli env add' or set the VTIGER_* variables")
}

pub fn connect(env: Option<&str>) -> Result<VtigerClient> {
    let options = resolve_options(env)?;
    eprintln!("{} {}", "🌍 Using".dimmed(), options.base_url.bright_green().bold());
    let client = VtigerClient::new(options).context("Failed to create vtiger client")?;
    Ok(client)
}
