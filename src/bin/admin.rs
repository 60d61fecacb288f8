//! CLI administration tool for slug-engine.
//!
//! Manages links directly against the configured store, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a link with a generated slug
//! cargo run --bin admin -- link create https://example.com
//!
//! # Create a link with a custom slug
//! cargo run --bin admin -- link create https://example.com --slug launch
//!
//! # Show, list and delete links
//! cargo run --bin admin -- link get launch
//! cargo run --bin admin -- link list --limit 20
//! cargo run --bin admin -- link delete launch
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server. `DATABASE_URL` (or the `DB_*` components) must point
//! at PostgreSQL; when `REDIS_URL` is set, cache entries of changed links are
//! invalidated there as well.

use slug_engine::application::services::{
    CreateLink, GenerationMode, LinkService, LinkStore, SlugGenerator,
};
use slug_engine::config::{self, Config};
use slug_engine::domain::repositories::KvStore;
use slug_engine::infrastructure::cache::{LinkCache, MokaLinkCache, RedisLinkCache};
use slug_engine::infrastructure::persistence::PgKvStore;
use slug_engine::infrastructure::providers::DisabledCompletion;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing slug-engine links.
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
    /// Manage links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// Create a link
    Create {
        /// Target URL
        url: String,

        /// Custom slug (generated if not provided)
        #[arg(short, long)]
        slug: Option<String>,

        /// Free-form comment stored with the link
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Show a link
    Get {
        slug: String,
    },

    /// List links in slug order
    List {
        /// Maximum number of links to show
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Start after this slug
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Delete a link
    Delete {
        slug: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
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
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Link { action } => handle_link_action(action, &config, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Wires a link service over the Postgres store.
async fn link_service(config: &Config, pool: &PgPool) -> Result<LinkService> {
    let cache: Arc<dyn LinkCache> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisLinkCache::connect(url, config.cache_settings())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?,
        ),
        None => Arc::new(MokaLinkCache::new(config.cache_settings())),
    };

    let kv: Arc<dyn KvStore> = Arc::new(PgKvStore::new(Arc::new(pool.clone())));
    let policy = Arc::new(config.slug_policy()?);
    let store = Arc::new(LinkStore::new(
        kv,
        cache,
        policy.clone(),
        config.list_query_limit,
    ));
    let generator = Arc::new(SlugGenerator::new(
        store.clone(),
        Arc::new(DisabledCompletion),
        policy,
        config.generation_settings(),
    ));

    Ok(LinkService::new(store, generator))
}

/// Dispatches link management commands.
async fn handle_link_action(action: LinkAction, config: &Config, pool: &PgPool) -> Result<()> {
    let service = link_service(config, pool).await?;

    match action {
        LinkAction::Create { url, slug, comment } => {
            create_link(&service, url, slug, comment).await?;
        }
        LinkAction::Get { slug } => {
            show_link(&service, &slug).await?;
        }
        LinkAction::List { limit, cursor } => {
            list_links(&service, cursor, limit).await?;
        }
        LinkAction::Delete { slug, yes } => {
            delete_link(&service, &slug, yes).await?;
        }
    }

    Ok(())
}

async fn create_link(
    service: &LinkService,
    url: String,
    slug: Option<String>,
    comment: Option<String>,
) -> Result<()> {
    println!("{}", "🔗 Create Link".bright_blue().bold());
    println!();

    let record = service
        .create(CreateLink {
            url,
            slug,
            comment,
            mode: GenerationMode::Random,
            ..Default::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create link: {}", e))?;

    println!("{}", "✅ Link created successfully!".green().bold());
    println!();
    println!("  Slug: {}", record.slug.bright_yellow().bold());
    println!("  URL:  {}", record.url.cyan());
    println!();

    Ok(())
}

async fn show_link(service: &LinkService, slug: &str) -> Result<()> {
    let record = service
        .get(slug)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    println!("  Slug:    {}", record.slug.bright_yellow().bold());
    println!("  URL:     {}", record.url.cyan());
    if let Some(title) = &record.title {
        println!("  Title:   {}", title);
    }
    if let Some(comment) = &record.comment {
        println!("  Comment: {}", comment);
    }
    println!(
        "  Created: {}",
        record
            .created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    if let Some(expires_at) = record.expires_at {
        println!(
            "  Expires: {}",
            expires_at.format("%Y-%m-%d %H:%M").to_string().yellow()
        );
    }
    println!();

    Ok(())
}

/// Lists links in slug order.
///
/// # Output Format
///
/// ```text
/// 📋 Links
///
///   Slug                 Created              URL
///   ─────────────────────────────────────────────────────────────────────────
///   launch               2024-01-15 10:30     https://example.com/launch
/// ```
async fn list_links(service: &LinkService, cursor: Option<String>, limit: usize) -> Result<()> {
    println!("{}", "📋 Links".bright_blue().bold());
    println!();

    let page = service
        .list(cursor, Some(limit))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if page.links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<20} {:<20} {}",
        "Slug".bright_white().bold(),
        "Created".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &page.links {
        println!(
            "  {:<20} {:<20} {}",
            link.slug.cyan(),
            link.created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            link.url
        );
    }

    println!();
    println!(
        "  Shown: {}",
        page.links.len().to_string().bright_white().bold()
    );
    if let Some(cursor) = page.cursor.filter(|_| !page.list_complete) {
        println!("  More available, continue with: --cursor {}", cursor.bright_cyan());
    }
    println!();

    Ok(())
}

/// Deletes a link with confirmation prompt (default: No).
async fn delete_link(service: &LinkService, slug: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑️  Delete Link".bright_blue().bold());
    println!();

    let record = service
        .get(slug)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("  Slug: {}", record.slug.cyan());
    println!("  URL:  {}", record.url.bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    service
        .delete(&record.slug)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

    println!();
    println!("{}", "✅ Link deleted successfully!".green().bold());
    println!();

    Ok(())
}

/// Displays stored link and click counts.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM kv_entries \
         WHERE key LIKE 'link:%' AND (expires_at IS NULL OR expires_at > NOW())",
    )
    .fetch_one(pool)
    .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks")
        .fetch_one(pool)
        .await?;

    let bot_clicks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks WHERE is_bot")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:       {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:      {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Bot clicks:  {}",
        bot_clicks.to_string().bright_black()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
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
