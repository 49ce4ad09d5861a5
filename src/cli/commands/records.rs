use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::cli::{context, output};

pub async fn retrieve_command(env: Option<&str>, id: &str, module: Option<&str>) -> Result<()> {
    let client = context::connect(env)?;
    let entities = client.entities();

    let record: Value = match module {
        Some(module) => entities.retrieve_by_numeric_id(module, parse_numeric(id)?).await,
        None => entities.retrieve(id).await,
    }
    .with_context(|| format!("Failed to retrieve record {}", id))?;

    output::print_json(&record)
}

pub async fn delete_command(env: Option<&str>, id: &str, module: Option<&str>) -> Result<()> {
    let client = context::connect(env)?;
    let entities = client.entities();

    let deleted = match module {
        Some(module) => entities.delete_by_numeric_id(module, parse_numeric(id)?).await,
        None => entities.delete(id).await,
    }
    .with_context(|| format!("Failed to delete record {}", id))?;

    if deleted {
        output::success(format!("Record {} deleted", id));
    } else {
        output::failure(format!("The server did not confirm deleting {}", id));
    }
    Ok(())
}

pub async fn sync_command(env: Option<&str>, module: Option<&str>, since: Option<&str>) -> Result<()> {
    let since = since.map(parse_since).transpose()?;
    let client = context::connect(env)?;

    let changes = client
        .entities()
        .sync(since, module)
        .await
        .context("Failed to sync records")?;

    output::print_json(&changes)
}

fn parse_numeric(id: &str) -> Result<i64> {
    id.parse()
        .with_context(|| format!("'{}' is not a numeric id; pass a typed id without --module", id))
}

/// RFC 3339 timestamp, or a plain date meaning midnight UTC
fn parse_since(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("'{}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date", raw))?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}
