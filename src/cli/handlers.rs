//! Subcommand implementations. Each returns the process exit code.

use super::commands::{ChunkArgs, CleanArgs, OutputFormatArg, ScrapeArgs, SearchArgs, ServeArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::api;
use crate::config::{DatabaseConfig, LexaiConfig};
use crate::embedding::{BgeM3Embedder, Embedder};
use crate::ingest::{chunk_and_upsert, embed_pending, Checkpoint};
use crate::preprocess::clean_jsonl;
use crate::scraper::{Crawler, DecisionCache, HttpFetcher};
use crate::search::SearchService;
use crate::store::{ChunkStore, PgStore};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

fn exit_code(command: &str, result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{} failed: {:#}", command, e);
            1
        }
    }
}

async fn connect_store() -> Result<PgStore> {
    let db = DatabaseConfig::from_env().map_err(|e| {
        eprintln!("\nSet DB_NAME, DB_USER, DB_PASSWORD and DB_HOST (DB_PORT defaults to 5432).");
        anyhow::Error::new(e)
    })?;
    PgStore::connect(&db)
        .await
        .with_context(|| format!("Failed to connect to {}", db))
}

/// Loads BGE-M3 on a blocking thread; the first run downloads the weights
async fn load_embedder(config: &LexaiConfig) -> Result<Arc<dyn Embedder>> {
    let cache_dir = config.model_cache_dir.clone();
    let embedder = tokio::task::spawn_blocking(move || BgeM3Embedder::load(cache_dir))
        .await
        .context("Model loading task failed")?
        .context("Failed to load embedding model")?;
    Ok(Arc::new(embedder))
}

async fn run_init_db(quiet: bool) -> Result<()> {
    let store = connect_store().await?;
    store.initialize_schema().await?;
    if !quiet {
        println!("Database initialized.");
    }
    Ok(())
}

pub async fn handle_init_db(quiet: bool) -> i32 {
    exit_code("init-db", run_init_db(quiet).await)
}

async fn run_scrape(args: &ScrapeArgs, config: &LexaiConfig, quiet: bool) -> Result<()> {
    let mut scraper = config.scraper.clone();
    if args.max_per_month.is_some() {
        scraper.max_decisions_per_month = args.max_per_month;
    }
    let output = args.output.clone().unwrap_or_else(|| config.paths.raw_jsonl());

    let cache = DecisionCache::open(config.paths.scrape_cache_dir(), config.paths.scrape_checkpoint())?;
    info!("{} decisions already cached", cache.done_count());

    let fetcher = HttpFetcher::new(&scraper)?;
    let mut crawler = Crawler::new(fetcher, scraper, cache).with_progress(!quiet);
    let summary = crawler.run(&output).await?;

    if !quiet {
        println!(
            "Saved {} decisions to {} ({} fetched, {} cached, {} failed)",
            summary.written,
            output.display(),
            summary.fetched,
            summary.from_cache,
            summary.failed
        );
    }
    Ok(())
}

pub async fn handle_scrape(args: &ScrapeArgs, config: &LexaiConfig, quiet: bool) -> i32 {
    exit_code("scrape", run_scrape(args, config, quiet).await)
}

pub fn handle_clean(args: &CleanArgs, config: &LexaiConfig, quiet: bool) -> i32 {
    let input = args.input.clone().unwrap_or_else(|| config.paths.raw_jsonl());
    let output = args.output.clone().unwrap_or_else(|| config.paths.cleaned_jsonl());

    exit_code(
        "clean",
        clean_jsonl(&input, &output)
            .with_context(|| format!("Failed to clean {}", input.display()))
            .map(|stats| {
                if !quiet {
                    println!(
                        "Cleaned {} records ({} trimmed, {} malformed) into {}",
                        stats.records,
                        stats.trimmed,
                        stats.malformed,
                        output.display()
                    );
                }
            }),
    )
}

async fn run_chunk(store: &dyn ChunkStore, input: Option<PathBuf>, config: &LexaiConfig, quiet: bool) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.cleaned_jsonl());
    let checkpoint = Checkpoint::new(config.paths.chunk_checkpoint());
    let stats = chunk_and_upsert(store, &input, &checkpoint, &config.chunking)
        .await
        .with_context(|| format!("Failed to ingest {}", input.display()))?;

    if !quiet {
        println!(
            "Chunked {} records: {} chunks inserted, {} already stored, {} records failed, {} skipped",
            stats.records, stats.chunks_inserted, stats.duplicates, stats.failed_records, stats.skipped
        );
    }
    Ok(())
}

async fn run_embed(store: &dyn ChunkStore, config: &LexaiConfig, quiet: bool) -> Result<()> {
    let embedder = load_embedder(config).await?;
    let stats = embed_pending(store, embedder).await?;
    if !quiet {
        println!(
            "Embedded {} of {} pending chunks ({} failed)",
            stats.embedded, stats.pending, stats.failed
        );
    }
    Ok(())
}

pub async fn handle_chunk(args: &ChunkArgs, config: &LexaiConfig, quiet: bool) -> i32 {
    let result = match connect_store().await {
        Ok(store) => run_chunk(&store, args.input.clone(), config, quiet).await,
        Err(e) => Err(e),
    };
    exit_code("chunk", result)
}

pub async fn handle_embed(config: &LexaiConfig, quiet: bool) -> i32 {
    let result = match connect_store().await {
        Ok(store) => run_embed(&store, config, quiet).await,
        Err(e) => Err(e),
    };
    exit_code("embed", result)
}

async fn run_ingest(args: &ChunkArgs, config: &LexaiConfig, quiet: bool) -> Result<()> {
    let store = connect_store().await?;
    run_chunk(&store, args.input.clone(), config, quiet).await?;
    run_embed(&store, config, quiet).await
}

pub async fn handle_ingest(args: &ChunkArgs, config: &LexaiConfig, quiet: bool) -> i32 {
    exit_code("ingest", run_ingest(args, config, quiet).await)
}

async fn run_search(args: &SearchArgs, config: &LexaiConfig) -> Result<()> {
    let store: Arc<dyn ChunkStore> = Arc::new(connect_store().await?);
    let embedder = load_embedder(config).await?;
    let service = SearchService::new(embedder, store);

    let hits = service.search(&args.query, args.k).await?;
    let format = match args.format {
        OutputFormatArg::Json => OutputFormat::Json,
        OutputFormatArg::Human => OutputFormat::Human,
    };
    print!("{}", OutputFormatter::new(format).format_hits(args.query.trim(), &hits)?);
    Ok(())
}

pub async fn handle_search(args: &SearchArgs, config: &LexaiConfig) -> i32 {
    exit_code("search", run_search(args, config).await)
}

async fn run_serve(args: &ServeArgs, config: &LexaiConfig) -> Result<()> {
    let bind: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address {}", config.bind))?,
    };

    // Fail fast: no listener until both the database and the model are ready
    let store: Arc<dyn ChunkStore> = Arc::new(connect_store().await?);
    let embedder = load_embedder(config).await?;
    info!("Search API ready");

    api::run_server(bind, SearchService::new(embedder, store))
        .await
        .with_context(|| format!("Server on {} failed", bind))
}

pub async fn handle_serve(args: &ServeArgs, config: &LexaiConfig) -> i32 {
    exit_code("serve", run_serve(args, config).await)
}
