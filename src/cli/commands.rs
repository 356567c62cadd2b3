use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use archmap::cache::ResultCache;
use archmap::config::AnalysisConfig;
use archmap::error::Result;
use archmap::facts::FactSummary;
use archmap::graph::{DependencyResolver, Resolution};
use archmap::indexer::{ProjectAggregator, ProjectFacts};

#[derive(Parser)]
#[command(name = "archmap")]
#[command(about = "Extract architectural facts from a source tree and resolve them into a dependency graph")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Per-file facts of the current directory
    archmap facts

    # Facts of a single file
    archmap facts --file src/users/service.py

    # Condensed per-language summary, html/css included
    archmap summary ./webapp --markup

    # Resolved dependency graph (cached by a hash of the extracted facts)
    archmap graph ./backend

    # Inspect or empty the result cache
    archmap cache info
    archmap cache clear
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache directory (takes precedence over ARCHMAP_CACHE_DIR and archmap.toml)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the facts extracted from every supported file
    Facts {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Analyze only this file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Include html and css files
        #[arg(long)]
        markup: bool,
    },

    /// Print the per-language fact summary
    Summary {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include html and css files
        #[arg(long)]
        markup: bool,
    },

    /// Print the resolved project graph
    Graph {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include html and css files
        #[arg(long)]
        markup: bool,

        /// Recompute even when a cached graph exists
        #[arg(long)]
        no_cache: bool,

        /// Print the resolution report instead of the graph
        #[arg(long)]
        report: bool,
    },

    /// Manage the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Delete every cached record
    Clear,

    /// Show the cache directory and its records
    Info {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// Config, facts and resolved graph of one project.
struct Analysis {
    config: AnalysisConfig,
    facts: ProjectFacts,
    resolution: Resolution,
}

impl Analysis {
    fn summary(&self) -> FactSummary {
        FactSummary::build(
            self.facts.files(),
            &self.resolution.graph,
            &self.config.summary,
        )
    }
}

fn load_config(path: &Path, markup: bool) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::load(path)?;
    if markup {
        config.include_markup = true;
    }
    Ok(config)
}

fn cache_location(config: &AnalysisConfig, cache_dir: Option<&PathBuf>) -> PathBuf {
    cache_dir
        .cloned()
        .unwrap_or_else(|| config.resolve_cache_dir())
}

fn analyze(path: &Path, config: AnalysisConfig) -> Result<Analysis> {
    let aggregator = ProjectAggregator::new(config);
    let facts = aggregator.aggregate(path)?;
    let snapshot = aggregator.progress().snapshot();
    eprintln!(
        "Analyzed {} files ({} classes, {} failed) in {} ms",
        snapshot.files_processed, snapshot.classes_found, snapshot.failures, snapshot.elapsed_ms
    );

    let resolution = DependencyResolver::new().resolve(facts.files());
    Ok(Analysis {
        config: aggregator.config().clone(),
        facts,
        resolution,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints per-file facts of a project, or of a single file.
pub fn facts(path: &Path, file: Option<&Path>, markup: bool) -> Result<()> {
    let config = load_config(path, markup)?;

    if let Some(file) = file {
        let aggregator = ProjectAggregator::new(config);
        let facts = aggregator.analyze_file(file)?;
        return print_json(&facts);
    }

    let aggregator = ProjectAggregator::new(config);
    let project = aggregator.aggregate(path)?;
    for failure in &project.failures {
        eprintln!("skipped {}: {}", failure.path.display(), failure.reason);
    }
    print_json(&project.by_language)
}

pub fn summary(path: &Path, markup: bool) -> Result<()> {
    let config = load_config(path, markup)?;
    let analysis = analyze(path, config)?;
    print_json(&analysis.summary())
}

/// Prints the project graph. The rendered graph is cached under the hash of
/// the full extracted facts, so an unchanged project is not re-rendered.
pub fn graph(
    path: &Path,
    markup: bool,
    no_cache: bool,
    report: bool,
    cache_dir: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(path, markup)?;
    let analysis = analyze(path, config)?;

    if report {
        return print_json(&analysis.resolution.report);
    }

    let render = || -> Result<String> {
        Ok(serde_json::to_string_pretty(&analysis.resolution.graph)?)
    };
    if no_cache {
        println!("{}", render()?);
        return Ok(());
    }

    let artifact = match ResultCache::open(cache_location(&analysis.config, cache_dir)) {
        Ok(cache) => {
            let key = analysis.facts.cache_key()?;
            cache.get_or_compute(&key, render)?
        }
        Err(e) => {
            tracing::warn!("Cache unavailable, rendering without it: {}", e);
            render()?
        }
    };
    println!("{}", artifact);
    Ok(())
}

fn open_cache(cache_dir: Option<&PathBuf>) -> Result<ResultCache> {
    let config = load_config(Path::new("."), false)?;
    ResultCache::open(cache_location(&config, cache_dir))
}

pub fn cache_clear(cache_dir: Option<&PathBuf>) -> Result<()> {
    let cache = open_cache(cache_dir)?;
    let removed = cache.clear()?;
    println!("Removed {} records from {}", removed, cache.dir().display());
    Ok(())
}

pub fn cache_info(cache_dir: Option<&PathBuf>, format: &str) -> Result<()> {
    let cache = open_cache(cache_dir)?;
    let info = cache.info()?;

    if format == "json" {
        return print_json(&info);
    }

    println!("Cache directory: {}", info.directory.display());
    if info.records.is_empty() {
        println!("No cached records");
        return Ok(());
    }
    println!("Records ({}, {} bytes):", info.records.len(), info.total_bytes());
    for record in &info.records {
        println!("  {}  {} bytes", record.key_prefix, record.size_bytes);
    }
    Ok(())
}
