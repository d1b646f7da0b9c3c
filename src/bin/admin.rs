//! CLI administration tool for tierlink.
//!
//! Inspects short URLs, codes and rollups directly against the store,
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Item counts per kind
//! cargo run --bin admin -- stats
//!
//! # Codes owned by a user
//! cargo run --bin admin -- links user-42
//!
//! # Target of a code, and what the code encodes
//! cargo run --bin admin -- resolve stdAb3xK9q
//! cargo run --bin admin -- decode stdAb3xK9q
//!
//! # Daily rollups
//! cargo run --bin admin -- metrics stdAb3xK9q --from 2025-01-01 --to 2025-01-31
//!
//! # Drop expired applied-event markers
//! cargo run --bin admin -- purge-markers
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `tierlink::config`); `DATABASE_URL` and
//! `CODE_SALT` are required.

use tierlink::config::{self, Config};
use tierlink::domain::repositories::{MetricsRepository, ShortUrlRepository};
use tierlink::infrastructure::persistence::{
    PgMetricsRepository, PgShortUrlRepository, connect_pool, keys,
};
use tierlink::utils::code_encoder::CodeEncoder;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for inspecting tierlink data.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Show item counts
    Stats,

    /// List the codes owned by a user
    Links {
        /// Owner id as sent in `X-Owner-Id`
        owner_id: String,
    },

    /// Show the stored record of a code
    Resolve { code: String },

    /// Show the tier and counter a code encodes
    Decode { code: String },

    /// Show daily rollups of a code
    Metrics {
        code: String,

        /// First day, inclusive (default: today, UTC)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day, inclusive (default: today, UTC)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Delete applied-event markers past their retention
    PurgeMarkers,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Failed to load configuration")?;

    if let Commands::Decode { code } = &cli.command {
        return decode_code(&config, code);
    }

    let pool = Arc::new(connect_pool(&config).await?);

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Links { owner_id } => list_links(pool, &owner_id).await?,
        Commands::Resolve { code } => resolve_code(pool, &code).await?,
        Commands::Metrics { code, from, to } => {
            show_metrics(&config, pool, &code, from, to).await?
        }
        Commands::PurgeMarkers => purge_markers(&config, pool).await?,
        Commands::Decode { .. } => {}
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Counts items of each kind in the entities table.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let short_urls = count_items(pool, keys::SHORT_URL_PREFIX, keys::DETAILS_SK).await?;
    let rollups =
        count_items(pool, keys::SHORT_URL_PREFIX, &format!("{}%", keys::DAY_PREFIX)).await?;
    let markers =
        count_items(pool, keys::SHORT_URL_PREFIX, &format!("{}%", keys::EVENT_PREFIX)).await?;
    let owners: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT pk) FROM entities WHERE pk LIKE $1")
            .bind(format!("{}%", keys::OWNER_PREFIX))
            .fetch_one(pool)
            .await?;

    for (label, count) in [
        ("Short URLs:", short_urls),
        ("Owners:", owners),
        ("Rollups:", rollups),
        ("Event markers:", markers),
    ] {
        println!("  {:<15} {}", label, count.to_string().bright_green().bold());
    }

    let counter = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT (attrs->>'value')::BIGINT FROM entities WHERE pk = $1 AND sk = $2",
    )
    .bind(keys::COUNTER_PK)
    .bind(keys::COUNTER_SK)
    .fetch_optional(pool)
    .await?
    .flatten();

    println!(
        "  {:<15} {}",
        "Store counter:",
        counter
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unset".to_string())
            .bright_black()
    );
    println!();

    Ok(())
}

async fn count_items(pool: &PgPool, pk_prefix: &str, sk_pattern: &str) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM entities WHERE pk LIKE $1 AND sk LIKE $2")
        .bind(format!("{pk_prefix}%"))
        .bind(sk_pattern)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn list_links(pool: Arc<PgPool>, owner_id: &str) -> Result<()> {
    let repo = PgShortUrlRepository::new(pool);

    let codes = repo
        .list_by_owner(owner_id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list codes: {}", e))?;

    println!("{} {}", "Short URLs of".bright_blue().bold(), owner_id.cyan());
    println!();

    if codes.is_empty() {
        println!("{}", "  No short URLs found".yellow());
        return Ok(());
    }

    for code in &codes {
        println!("  {}", code.bright_white());
    }

    println!();
    println!("  Total: {}", codes.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn resolve_code(pool: Arc<PgPool>, code: &str) -> Result<()> {
    let repo = PgShortUrlRepository::new(pool);

    let record = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Short URL not found")?;

    println!("  Code:    {}", record.code.cyan());
    println!("  Target:  {}", record.target_url.bright_white());
    println!("  Owner:   {}", record.owner_id.bright_white());
    println!(
        "  Created: {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .bright_black()
    );

    Ok(())
}

/// Takes a code apart with the configured salt. Needs no database.
fn decode_code(config: &Config, code: &str) -> Result<()> {
    let encoder = CodeEncoder::new(&config.code_salt, config.code_min_length)
        .context("Invalid short code settings")?;

    match encoder.parse_short_code(code) {
        Some(parsed) => {
            println!("  Code:    {}", code.cyan());
            println!("  Tier:    {}", parsed.tier.tag().bright_white());
            println!("  Counter: {}", parsed.counter.to_string().bright_white());
        }
        None => {
            println!("{}", "Not a code issued with this salt".red().bold());
        }
    }

    Ok(())
}

async fn show_metrics(
    config: &Config,
    pool: Arc<PgPool>,
    code: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let today = Utc::now().date_naive();
    let from = from.unwrap_or(today);
    let to = to.unwrap_or(today);

    let repo = PgMetricsRepository::new(pool, config.metrics_dedup_retention_hours);
    let days = repo
        .daily_range(code, from, to)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load metrics: {}", e))?;

    println!(
        "{} {} ({} .. {})",
        "Metrics of".bright_blue().bold(),
        code.cyan(),
        from,
        to
    );
    println!();

    if days.is_empty() {
        println!("{}", "  No hits in range".yellow());
        return Ok(());
    }

    for day in &days {
        println!(
            "  {}  {}",
            day.day.to_string().bright_white(),
            day.counts.total_hits.to_string().bright_green().bold()
        );
        for (label, breakdown) in [
            ("country", &day.counts.by_country),
            ("device", &day.counts.by_device_type),
            ("referrer", &day.counts.by_referrer),
        ] {
            let parts: Vec<String> = breakdown.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("    {:<9} {}", label.bright_black(), parts.join(" "));
        }
    }
    println!();

    Ok(())
}

async fn purge_markers(config: &Config, pool: Arc<PgPool>) -> Result<()> {
    let repo = PgMetricsRepository::new(pool, config.metrics_dedup_retention_hours);

    let removed = repo
        .purge_expired_markers()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge markers: {}", e))?;

    println!(
        "{} {}",
        "Removed event markers:".green().bold(),
        removed.to_string().bright_white()
    );

    Ok(())
}
