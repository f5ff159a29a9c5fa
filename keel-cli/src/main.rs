//! KEEL CLI
//!
//! Command-line interface for the KEEL offline asset cache.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use keel_core::constants::{DEFAULT_CACHE_NAME, DEFAULT_NETWORK_TIMEOUT_MS};
use keel_core::traits::{CacheStorage, Fetcher};
use keel_core::types::{Request, RequestMode, Response};
use keel_fetch::HttpFetcher;
use keel_proxy::{ProxyConfig, ProxyServer};
use keel_storage::FileCacheStorage;
use keel_worker::{Clients, FetchOutcome, Registration, Worker, WorkerConfig};

/// KEEL - offline asset cache for static sites
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// File the caches are persisted in
    #[arg(long, global = true, env = "KEEL_CACHE_FILE", default_value = "keel-caches.bin")]
    cache_file: PathBuf,

    /// Name of the current cache
    #[arg(long, global = true, env = "KEEL_CACHE_NAME", default_value = DEFAULT_CACHE_NAME)]
    cache_name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the caching proxy in front of a site
    Serve {
        /// Upstream site URL
        #[arg(short, long, env = "KEEL_ORIGIN")]
        origin: String,
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Navigation network timeout in milliseconds
        #[arg(long, env = "KEEL_NETWORK_TIMEOUT_MS", default_value_t = DEFAULT_NETWORK_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Pre-populate the cache with the site's core assets
    Install {
        /// Site URL
        #[arg(short, long, env = "KEEL_ORIGIN")]
        origin: String,
    },

    /// Fetch one URL through the cache
    Fetch {
        /// Absolute URL, or a path relative to --origin
        url: String,
        /// Site URL the path resolves against
        #[arg(short, long, env = "KEEL_ORIGIN")]
        origin: Option<String>,
        /// Treat the request as a page navigation
        #[arg(short, long)]
        navigate: bool,
        /// Navigation network timeout in milliseconds
        #[arg(long, env = "KEEL_NETWORK_TIMEOUT_MS", default_value_t = DEFAULT_NETWORK_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Inspect or delete persisted caches
    Caches {
        #[command(subcommand)]
        command: CachesCommand,
    },
}

#[derive(Subcommand)]
enum CachesCommand {
    /// List caches and their entries
    List,
    /// Delete caches
    Purge {
        /// Only delete this cache
        name: Option<String>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "info,keel_worker=debug,keel_storage=debug,keel_fetch=debug,keel_proxy=debug"
    } else {
        "warn,keel_proxy=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            origin,
            port,
            bind,
            timeout_ms,
        } => cmd_serve(&cli.cache_file, &cli.cache_name, &origin, &bind, port, timeout_ms).await,
        Commands::Install { origin } => cmd_install(&cli.cache_file, &cli.cache_name, &origin).await,
        Commands::Fetch {
            url,
            origin,
            navigate,
            timeout_ms,
        } => {
            cmd_fetch(
                &cli.cache_file,
                &cli.cache_name,
                &url,
                origin.as_deref(),
                navigate,
                timeout_ms,
            )
            .await
        }
        Commands::Caches { command } => match command {
            CachesCommand::List => cmd_caches_list(&cli.cache_file).await,
            CachesCommand::Purge { name, yes } => {
                cmd_caches_purge(&cli.cache_file, name.as_deref(), yes).await
            }
        },
    }
}

async fn open_storage(path: &Path) -> Result<FileCacheStorage> {
    FileCacheStorage::new(path)
        .await
        .with_context(|| format!("Failed to open cache file {}", path.display()))
}

/// Run the caching proxy
async fn cmd_serve(
    cache_file: &Path,
    cache_name: &str,
    origin: &str,
    bind: &str,
    port: u16,
    timeout_ms: u64,
) -> Result<()> {
    println!("{}", "🚀 Starting KEEL proxy...".cyan().bold());

    let config = ProxyConfig::new(origin)
        .context("Invalid origin")?
        .with_cache_name(cache_name)
        .with_cache_file(cache_file)
        .with_network_timeout(Duration::from_millis(timeout_ms));

    let server = ProxyServer::start(config)
        .await
        .context("Failed to install worker")?;

    println!("   {} {}", "Origin:".dimmed(), origin);
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/__keel/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    server.run(addr).await?;

    Ok(())
}

/// Install and activate a worker against the file storage
async fn cmd_install(cache_file: &Path, cache_name: &str, origin: &str) -> Result<()> {
    println!("{} {}", "📦 Installing core assets from:".cyan().bold(), origin);

    let storage = open_storage(cache_file).await?;
    let config = WorkerConfig::for_scope(origin)
        .context("Invalid origin")?
        .cache_name(cache_name);
    let assets = config.core_assets.clone();

    let clients = Arc::new(Clients::new());
    let registration = Registration::new(clients.clone());
    let worker = Arc::new(Worker::new(
        config,
        Arc::new(storage.clone()),
        Arc::new(HttpFetcher::new()?),
        clients,
    )?);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("   {spinner:.green} {msg}")?);
    pb.set_message(format!("fetching {} assets", assets.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = registration.register(worker.clone()).await;
    pb.finish_and_clear();
    result.context("Install failed")?;

    storage.flush().await?;

    println!("\n{} {}", "✅ Installed into cache".green().bold(), cache_name.yellow());
    for asset in &assets {
        println!("   {} {}", "•".dimmed(), asset);
    }

    let remaining = storage.keys().await?;
    println!("\n   {} {}", "Caches on disk:".dimmed(), remaining.join(", "));
    debug!(worker = %worker.id(), state = %worker.state(), "Worker settled");

    Ok(())
}

/// Fetch a single URL with the worker's strategy
async fn cmd_fetch(
    cache_file: &Path,
    cache_name: &str,
    url: &str,
    origin: Option<&str>,
    navigate: bool,
    timeout_ms: u64,
) -> Result<()> {
    let scope = origin.unwrap_or(url);
    let config = WorkerConfig::for_scope(scope)
        .context("Invalid URL")?
        .cache_name(cache_name)
        .network_timeout(Duration::from_millis(timeout_ms));

    let mut request = Request::resolve(&config.scope, url).context("Invalid URL")?;
    if navigate {
        request = request
            .with_mode(RequestMode::Navigate)
            .with_header("accept", "text/html");
    }
    println!("{} {}", "🌐 Fetching:".cyan().bold(), request.url);

    let storage = open_storage(cache_file).await?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
    let worker = Worker::new(
        config,
        Arc::new(storage.clone()),
        fetcher,
        Arc::new(Clients::new()),
    )?;

    let outcome = worker.handle_fetch(request.clone()).await;

    // Let a background refresh land before the file is written
    worker.settle().await;
    storage.flush().await?;

    match outcome.context("Fetch failed")? {
        FetchOutcome::Respond(response) => print_response(&response),
        FetchOutcome::Passthrough => bail!("request was not handled"),
    }

    Ok(())
}

fn print_response(response: &Response) {
    let status = format!("{} {}", response.status, response.status_text);
    let status = if response.ok() { status.green() } else { status.red() };

    println!("\n   {} {}", "Status:".dimmed(), status.bold());
    if let Some(content_type) = response.content_type() {
        println!("   {} {}", "Type:".dimmed(), content_type);
    }
    println!("   {} {} bytes", "Size:".dimmed(), response.body.len());

    let is_text = response
        .content_type()
        .map(|t| t.starts_with("text/") || t.contains("json") || t.contains("xml"))
        .unwrap_or(false);
    if is_text {
        println!("\n{}", response.text());
    }
}

/// List persisted caches
async fn cmd_caches_list(cache_file: &Path) -> Result<()> {
    let storage = open_storage(cache_file).await?;
    let names = storage.keys().await?;

    if names.is_empty() {
        println!("{}", "No caches stored.".yellow());
        return Ok(());
    }

    for name in names {
        let entries = storage.open(&name).await?.entries().await?;
        println!("{} {} ({} entries)", "📁".cyan(), name.bold(), entries.len());
        for entry in entries {
            println!(
                "   {} {} {}",
                entry.response.status.to_string().green(),
                entry.request.url,
                entry.cached_at.to_rfc3339().dimmed()
            );
        }
    }

    Ok(())
}

/// Delete persisted caches
async fn cmd_caches_purge(cache_file: &Path, name: Option<&str>, yes: bool) -> Result<()> {
    let storage = open_storage(cache_file).await?;

    let targets: Vec<String> = match name {
        Some(name) => {
            if !storage.has(name).await? {
                bail!("cache '{}' does not exist", name);
            }
            vec![name.to_string()]
        }
        None => storage.keys().await?,
    };

    if targets.is_empty() {
        println!("{}", "No caches stored.".yellow());
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} cache(s): {}?", targets.len(), targets.join(", ")))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    for target in &targets {
        storage.delete(target).await?;
        println!("   {} {}", "🗑️  Deleted".red(), target);
    }
    storage.flush().await?;

    Ok(())
}
