//! dblpranker - DBLP publication scraper with venue ranking
//!
//! Grabs a researcher's DBLP publication page, splits the entries into
//! conference and journal streams, looks up a venue rank for each entry
//! (CORE portal for conferences, Scimago for journals), and exports the
//! ranked list as CSV.
//!
//! ## Usage
//!
//! ```bash
//! dblpranker "https://dblp.org/pid/x/Example.html" --out ranked.csv --cache
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use dblpranker::cache::RankCache;
use dblpranker::core_rank::CoreRankClient;
use dblpranker::dblp::{classify, DblpClient};
use dblpranker::export;
use dblpranker::patch::PatchTable;
use dblpranker::scimago::ScimagoClient;

/// On-disk cache for the conference stream
const CORE_CACHE_FILE: &str = "core.cache";

/// On-disk cache for the journal stream
const SCIMAGO_CACHE_FILE: &str = "scimagojr.cache";

/// Grabs DBLP and tries to find venue rankings (CORE and Scimago)
#[derive(Parser)]
#[command(name = "dblpranker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// URL of the target DBLP page
    url: Option<String>,

    /// The output file to generate
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Use a local cache for the ranking
    #[arg(short, long)]
    cache: bool,

    /// DBLP and Scimago rewriting rules for ranking queries
    #[arg(short, long, default_value = "patch.json")]
    patch: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    fmt().with_env_filter(filter).with_target(true).init();

    // Missing required options print the usage guide without an error exit.
    let (Some(url), Some(out)) = (cli.url.as_deref(), cli.out.as_deref()) else {
        Cli::command().print_help().context("Failed to print usage")?;
        return Ok(());
    };

    run_pipeline(url, out, cli.cache, &cli.patch).await
}

async fn run_pipeline(url: &str, out: &Path, use_cache: bool, patch_path: &Path) -> Result<()> {
    let patch = PatchTable::load(patch_path).context("Failed to load patch rules")?;

    let dblp = DblpClient::new()?;
    let mut entries = dblp
        .extract_entries(url)
        .await
        .context("Failed to extract DBLP entries")?;
    println!("Extracted {} entries from DBLP.", entries.len());

    let (conferences, journals) = classify(&mut entries);
    println!(
        "{} conference papers, {} journal articles.",
        conferences.len(),
        journals.len()
    );

    let core = CoreRankClient::new()?;
    let mut core_cache = if use_cache {
        RankCache::load(CORE_CACHE_FILE.into())
    } else {
        RankCache::new(CORE_CACHE_FILE.into())
    };
    core.resolve_all(conferences, &patch, &mut core_cache).await;
    if use_cache {
        core_cache.save().context("Failed to save CORE cache")?;
    }

    let scimago = ScimagoClient::new()?;
    let mut scimago_cache = if use_cache {
        RankCache::load(SCIMAGO_CACHE_FILE.into())
    } else {
        RankCache::new(SCIMAGO_CACHE_FILE.into())
    };
    scimago
        .resolve_all(journals, &patch, &mut scimago_cache)
        .await;
    if use_cache {
        scimago_cache
            .save()
            .context("Failed to save Scimago cache")?;
    }

    export::write_csv(out, &entries).context("Failed to write CSV output")?;
    println!("Wrote {} ranked entries to {}", entries.len(), out.display());
    Ok(())
}
