use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use serde_json::Value;

use crate::api::{Condition, QueryBuilder};
use crate::cli::{context, output};

#[derive(Args)]
pub struct QueryArgs {
    /// Module to query, e.g. "Leads"
    pub module: String,
    /// Comma-separated fields to return (all fields when omitted)
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,
    /// Exact match, as column=value (repeatable, AND-joined)
    #[arg(short, long = "filter", value_parser = parse_pair)]
    pub filters: Vec<(String, String)>,
    /// Substring match, as column=value (repeatable, AND-joined)
    #[arg(short, long = "contains", value_parser = parse_pair)]
    pub contains: Vec<(String, String)>,
    /// Comma-separated fields to order by
    #[arg(short, long, value_delimiter = ',')]
    pub order_by: Vec<String>,
    /// Order descending
    #[arg(long)]
    pub desc: bool,
    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<u32>,
    /// Number of records to skip
    #[arg(long)]
    pub offset: Option<u32>,
    /// Only count matching records
    #[arg(long)]
    pub count: bool,
    /// Print the compiled query without sending it
    #[arg(long)]
    pub print: bool,
}

pub async fn handle_query_command(env: Option<&str>, args: QueryArgs) -> Result<()> {
    let count = args.count;
    let print = args.print;
    let builder = build_query(args)?;

    if print {
        let text = if count { builder.build().compile_count()? } else { builder.compile()? };
        println!("{}", text);
        return Ok(());
    }

    eprintln!("📝 Query: {}", builder.compile()?.dimmed());
    let client = context::connect(env)?;

    if count {
        let total = builder.count(&client).await.context("Failed to count records")?;
        println!("{}", total);
        return Ok(());
    }

    let rows: Vec<Value> = builder.fetch_many(&client).await.context("Failed to execute query")?;
    output::print_json(&rows)?;
    eprintln!("{}", format!("{} records", rows.len()).dimmed());
    Ok(())
}

fn build_query(args: QueryArgs) -> Result<QueryBuilder> {
    let mut builder = QueryBuilder::new(args.module);

    if !args.select.is_empty() {
        builder = builder.select(args.select);
    }
    for (column, value) in args.filters {
        builder = builder.filter(Condition::eq(column, value));
    }
    for (column, value) in args.contains {
        builder = builder.filter(Condition::contains(column, value));
    }
    if !args.order_by.is_empty() {
        builder = if args.desc {
            builder.order_by_desc(args.order_by)?
        } else {
            builder.order_by(args.order_by)?
        };
    }
    if let Some(limit) = args.limit {
        builder = builder.take(limit);
    }
    if let Some(offset) = args.offset {
        builder = builder.skip(offset);
    }

    Ok(builder)
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim().to_string(), value.to_string())),
        _ => Err(format!("expected column=value, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: QueryArgs,
    }

    fn parse(argv: &[&str]) -> QueryArgs {
        TestCli::try_parse_from(std::iter::once("query").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("lastname=Smith").unwrap(), ("lastname".to_string(), "Smith".to_string()));
        assert_eq!(parse_pair("note=a=b").unwrap(), ("note".to_string(), "a=b".to_string()));
        assert!(parse_pair("lastname").is_err());
        assert!(parse_pair("=Smith").is_err());
    }

    #[test]
    fn test_build_query_from_flags() {
        let args = parse(&[
            "Leads",
            "--select",
            "firstname,lastname",
            "--filter",
            "leadstatus=Hot",
            "--contains",
            "company=Ltd",
            "--order-by",
            "lead_no",
            "--desc",
            "--limit",
            "10",
            "--offset",
            "2",
        ]);

        assert_eq!(
            build_query(args).unwrap().compile().unwrap(),
            "SELECT firstname, lastname FROM Leads WHERE leadstatus = 'Hot' AND company LIKE '%Ltd%' ORDER BY lead_no DESC LIMIT 2, 10;"
        );
    }

    #[test]
    fn test_bare_module_selects_everything() {
        let args = parse(&["Contacts"]);
        assert_eq!(build_query(args).unwrap().compile().unwrap(), "SELECT * FROM Contacts;");
    }
}
