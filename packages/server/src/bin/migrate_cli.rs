//! CLI for schema migrations
//!
//! Outputs one JSON document per command so scripts can parse the result.

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::migrate::Migrator;
use sqlx::PgPool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Parser)]
#[command(name = "migrate_cli")]
#[command(about = "Schema migration CLI for the recipe server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List migrations bundled into this binary
    List,

    /// Apply every pending migration
    Run,

    /// Show which bundled migrations are applied
    Status,
}

// ============================================================================
// JSON Response Types
// ============================================================================

#[derive(Serialize)]
struct Response {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<Vec<MigrationInfo>>,
}

#[derive(Serialize)]
struct MigrationInfo {
    version: i64,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<bool>,
}

fn output(resp: Response) -> Result<()> {
    println!("{}", serde_json::to_string(&resp)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => cmd_list(),
        Commands::Run => cmd_run().await,
        Commands::Status => cmd_status().await,
    }
}

async fn get_pool() -> Result<PgPool> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_list() -> Result<()> {
    let migrations = MIGRATOR
        .iter()
        .map(|m| MigrationInfo {
            version: m.version,
            description: m.description.to_string(),
            applied: None,
        })
        .collect();

    output(Response {
        success: true,
        message: None,
        migrations: Some(migrations),
    })
}

async fn cmd_run() -> Result<()> {
    let pool = get_pool().await?;

    match MIGRATOR.run(&pool).await {
        Ok(()) => output(Response {
            success: true,
            message: Some("All migrations applied".to_string()),
            migrations: None,
        }),
        Err(e) => output(Response {
            success: false,
            message: Some(format!("Migration failed: {}", e)),
            migrations: None,
        }),
    }
}

async fn cmd_status() -> Result<()> {
    let pool = get_pool().await?;

    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(&pool)
            .await
            .context("Failed to inspect migration table")?;

    let applied: HashMap<i64, bool> = if table_exists {
        sqlx::query_as::<_, (i64, bool)>("SELECT version, success FROM _sqlx_migrations")
            .fetch_all(&pool)
            .await
            .context("Failed to read applied migrations")?
            .into_iter()
            .collect()
    } else {
        HashMap::new()
    };

    let migrations: Vec<MigrationInfo> = MIGRATOR
        .iter()
        .map(|m| MigrationInfo {
            version: m.version,
            description: m.description.to_string(),
            applied: Some(applied.get(&m.version).copied().unwrap_or(false)),
        })
        .collect();

    let pending = migrations
        .iter()
        .filter(|m| m.applied == Some(false))
        .count();

    output(Response {
        success: true,
        message: Some(format!("{} pending", pending)),
        migrations: Some(migrations),
    })
}
