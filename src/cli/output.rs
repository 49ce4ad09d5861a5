//! Terminal output helpers

use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format JSON output")?;
    println!("{}", text);
    Ok(())
}

pub fn success(message: impl AsRef<str>) {
    println!("{} {}", "✓".bright_green().bold(), message.as_ref());
}

pub fn failure(message: impl AsRef<str>) {
    println!("{} {}", "✗".bright_red().bold(), message.as_ref());
}

pub fn info(label: &str, value: impl AsRef<str>) {
    println!("{} {}", format!("{}:", label).dimmed(), value.as_ref());
}
