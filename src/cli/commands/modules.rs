use anyhow::{Context, Result};
use colored::*;

use crate::cli::{context, output};

pub async fn login_command(env: Option<&str>) -> Result<()> {
    let client = context::connect(env)?;

    if !client.login().await.context("Login failed")? {
        output::failure("The server accepted the login but returned no user");
        return Ok(());
    }

    let session = client.session();
    output::success("Logged in");
    if let Some(user) = &session.current_user {
        output::info("User", format!("{} ({})", user.username, user.id));
    }
    output::info("Session", session.session_name.as_deref().unwrap_or("-"));
    output::info("Token expires", session.token_expiration.to_rfc3339());
    output::info("API version", session.api_version.to_string());
    output::info("CRM version", session.crm_version.to_string());
    Ok(())
}

pub async fn types_command(env: Option<&str>) -> Result<()> {
    let client = context::connect(env)?;
    let list = client.modules().list_types().await.context("Failed to list modules")?;

    for module in &list.types {
        println!("{}", module);
    }
    eprintln!("{}", format!("{} modules", list.types.len()).dimmed());
    Ok(())
}

pub async fn describe_command(env: Option<&str>, module: &str) -> Result<()> {
    let client = context::connect(env)?;
    let info = client
        .modules()
        .describe(module)
        .await
        .with_context(|| format!("Failed to describe module {}", module))?;

    println!("{} ({}) id prefix {}", info.name.bright_green().bold(), info.label, info.id_prefix.cyan());
    for field in &info.fields {
        let marker = if field.mandatory { "*".bright_red().to_string() } else { " ".to_string() };
        println!(
            " {} {:<30} {:<12} {}",
            marker,
            field.name,
            field.field_type.name.dimmed(),
            field.label
        );
    }
    Ok(())
}
