use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use core_types::SearchRequest;
use core_types::config::{AppConfig, EmbedderKind, load_or_create_config};
use entry_store::EntryStore;
use indicatif::{ProgressBar, ProgressStyle};
use query_cache::{CacheBackend, MemoryCache};
use semantic_index::CosineRanker;
use service::{
    CoordinatorConfig, Embedder, HashEmbedder, HttpEmbedder, QueryCoordinator,
    init_tracing_with_config, load_corpus,
};
use uuid::Uuid;

/// Debug / scripting CLI for the SemSearch demo backend.
#[derive(Parser, Debug)]
#[command(name = "semsearch-cli", version, about = "SemSearch demo backend client")]
struct Cli {
    /// Config file path (defaults to semsearch.toml or $SEMSEARCH_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed and insert a sentences file (one sentence per line).
    Load {
        file: PathBuf,
    },
    /// Run a query against the corpus.
    Search {
        query: String,
        /// Number of results to return.
        #[arg(short = 'k', long)]
        top_k: Option<u32>,
        /// Bypass the query cache.
        #[arg(long)]
        no_cache: bool,
    },
    /// Show query-cache statistics.
    CacheStats,
    /// Drop all cached query results.
    CacheClear,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = load_or_create_config(cli.config.as_deref())?;
    let _guard = init_tracing_with_config(&cfg.logging)?;

    let store = Arc::new(EntryStore::open(&cfg.store.db_path)?);
    let cache: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new(
        cfg.cache.capacity,
        Duration::from_secs(cfg.cache.ttl_secs),
    ));
    let embedder = build_embedder(&cfg)?;

    match cli.command {
        Commands::Load { file } => run_load(&store, embedder.as_ref(), &file).await,
        Commands::Search {
            query,
            top_k,
            no_cache,
        } => {
            let coordinator = QueryCoordinator::new(
                store,
                Arc::new(CosineRanker),
                cache,
                embedder,
                coordinator_config(&cfg),
            );
            let top_k = top_k.unwrap_or(cfg.search.default_top_k);
            run_search(&coordinator, &query, top_k, !no_cache).await
        }
        Commands::CacheStats => {
            let stats = cache.stats().await?;
            println!(
                "entries: {}  hits: {}  misses: {}",
                style(stats.entries).cyan(),
                style(stats.hits).green(),
                style(stats.misses).yellow()
            );
            Ok(())
        }
        Commands::CacheClear => {
            cache.clear().await?;
            println!("{}", style("Cache cleared.").green());
            Ok(())
        }
    }
}

fn build_embedder(cfg: &AppConfig) -> Result<Arc<dyn Embedder>> {
    match cfg.embedder.kind {
        EmbedderKind::Hash => Ok(Arc::new(HashEmbedder)),
        EmbedderKind::Http => {
            let embedder = HttpEmbedder::new(
                cfg.embedder.endpoint.clone(),
                Duration::from_millis(cfg.embedder.timeout_ms),
            )
            .context("build http embedder")?;
            Ok(Arc::new(embedder))
        }
    }
}

fn coordinator_config(cfg: &AppConfig) -> CoordinatorConfig {
    CoordinatorConfig {
        cache_op_timeout: Duration::from_millis(cfg.cache.op_timeout_ms),
        embed_timeout: Duration::from_millis(cfg.embedder.timeout_ms),
        embed_max_retries: cfg.embedder.max_retries,
        ..CoordinatorConfig::default()
    }
}

async fn run_load(store: &EntryStore, embedder: &dyn Embedder, file: &Path) -> Result<()> {
    let bar = ProgressBar::new(0).with_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("progress template")?,
    );

    let report = load_corpus(store, embedder, file, |done, total| {
        bar.set_length(total as u64);
        bar.set_position(done as u64);
    })
    .await
    .with_context(|| format!("load corpus from {}", file.display()))?;
    bar.finish_and_clear();

    println!(
        "{} inserted, {} duplicates skipped",
        style(report.inserted).green(),
        style(report.skipped_duplicates).yellow()
    );
    Ok(())
}

async fn run_search(
    coordinator: &QueryCoordinator,
    query: &str,
    top_k: u32,
    use_cache: bool,
) -> Result<()> {
    let req = SearchRequest {
        id: Uuid::new_v4(),
        query: query.to_string(),
        top_k,
        use_cache,
    };
    let resp = coordinator.handle(req).await?;

    if resp.hits.is_empty() {
        println!("{}", style("No results (is the corpus loaded?).").yellow());
        return Ok(());
    }

    let source = if resp.cache_hit { "cache" } else { "computed" };
    println!(
        "{} ({source}, {} ms)",
        style(format!("{} results", resp.hits.len())).cyan(),
        resp.took_ms
    );
    for (rank, hit) in resp.hits.iter().enumerate() {
        println!(
            "{:>3}. {:>6}  {}  {}",
            rank + 1,
            style(format!("{:.1}%", hit.score * 100.0)).green(),
            style(hit.id.as_str().get(..12).unwrap_or(hit.id.as_str())).dim(),
            hit.text
        );
    }
    Ok(())
}
