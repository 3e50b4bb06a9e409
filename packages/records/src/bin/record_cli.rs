//! CLI for running single record operations against the trade tables
//!
//! Prints one JSON object per invocation so it can be scripted.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use records::common::statement;
use records::domains::trade;
use records::{Config, PgDatabase, Record, Statement, TableSchema};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "record_cli")]
#[command(about = "Read, create, update and delete trade records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known tables and their columns
    Tables,

    /// Load a row by primary key
    Read(RecordArgs),

    /// Insert a row from the given fields
    Create(RecordArgs),

    /// Update the row identified by the primary-key fields
    Update(RecordArgs),

    /// Delete the row identified by the primary-key fields
    Delete(RecordArgs),
}

#[derive(Args)]
struct RecordArgs {
    /// Table name (see `tables`)
    table: String,

    /// Field value as name=value; repeatable
    #[arg(short, long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Print the SQL that would run without connecting
    #[arg(long)]
    dry_run: bool,
}

#[derive(Clone, Copy)]
enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize, Default)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<Vec<TableSchema>>,
}

fn output(resp: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON response, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,records=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let response = match cli.command {
        Commands::Tables => cmd_tables(),
        Commands::Read(args) => cmd_record(Operation::Read, args).await,
        Commands::Create(args) => cmd_record(Operation::Create, args).await,
        Commands::Update(args) => cmd_record(Operation::Update, args).await,
        Commands::Delete(args) => cmd_record(Operation::Delete, args).await,
    }?;

    output(&response)?;
    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_tables() -> Result<Response> {
    Ok(Response {
        success: true,
        tables: Some(
            trade::tables()
                .into_iter()
                .map(|schema| (*schema).clone())
                .collect(),
        ),
        ..Default::default()
    })
}

async fn cmd_record(operation: Operation, args: RecordArgs) -> Result<Response> {
    let Some(schema) = trade::schema_for(&args.table) else {
        return Ok(failure(format!("Unknown table '{}'", args.table)));
    };

    if let Some((name, _)) = args
        .fields
        .iter()
        .find(|(name, _)| schema.column(name).is_none())
    {
        return Ok(failure(format!(
            "Unknown field '{}' on table '{}'",
            name,
            schema.table()
        )));
    }

    if args.dry_run {
        return Ok(match dry_run_statement(&schema, operation, &args.fields) {
            Ok(stmt) => Response {
                success: true,
                sql: Some(stmt.inline()),
                ..Default::default()
            },
            Err(e) => failure(e.to_string()),
        });
    }

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => return Ok(failure(format!("{:#}", e))),
    };
    let mut record = Record::new(schema, Arc::new(PgDatabase::new(pool)));
    for (name, value) in &args.fields {
        if let Err(e) = record.set(name, value.as_str()) {
            return Ok(failure(e.to_string()));
        }
    }

    let result = match operation {
        Operation::Read => record.read_record().await,
        Operation::Create => record.create_record().await,
        Operation::Update => record.write_record().await,
        Operation::Delete => record.delete_record().await,
    };

    Ok(match result {
        Ok(()) => {
            tracing::info!(table = record.table(), "Record operation succeeded");
            Response {
                success: true,
                fields: Some(record.to_json()),
                ..Default::default()
            }
        }
        Err(e) => failure(
            record
                .last_error()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
        ),
    })
}

async fn connect() -> Result<PgPool> {
    let config = Config::from_env()?;
    config.connect().await
}

fn failure(message: impl Into<String>) -> Response {
    Response {
        success: false,
        message: Some(message.into()),
        ..Default::default()
    }
}

/// Build the statement from schema defaults overlaid with the given fields.
fn dry_run_statement(
    schema: &TableSchema,
    operation: Operation,
    fields: &[(String, String)],
) -> Result<Statement> {
    let mut values: IndexMap<String, String> = schema
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.default.clone()))
        .collect();

    for (name, value) in fields {
        match values.get_mut(name) {
            Some(slot) => *slot = value.clone(),
            None => bail!("Unknown field '{}' on table '{}'", name, schema.table()),
        }
    }

    Ok(match operation {
        Operation::Read => statement::select_by_key(schema, &values),
        Operation::Create => statement::insert(schema, &values),
        Operation::Update => statement::update_by_key(schema, &values)?,
        Operation::Delete => statement::delete_by_key(schema, &values),
    })
}
