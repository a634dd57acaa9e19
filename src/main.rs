use clap::{Parser, Subcommand};
use ngram_index::{
    rank, scan_documents, search_ranked, Corpus, IndexConfig, NgramError, NgramIndex,
    QueryOptions, ScanConfig, SearchHit,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ngram")]
#[command(about = "Fuzzy full-text search over character trigrams")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a small built-in dataset and query it
    Demo {
        /// Search query
        #[arg(short, long, default_value = "amaz")]
        query: String,

        /// Maximum results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Index a directory of text files and query it
    Search {
        /// Search query
        query: String,

        /// Directory to index (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// File extensions to include (e.g., md,txt)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// File or directory names to exclude below the scanned directory
        #[arg(short = 'x', long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Only index files whose name matches this glob
        #[arg(short, long)]
        glob: Option<String>,

        /// Maximum file size in MB
        #[arg(long, default_value = "10")]
        max_size: u64,

        /// Characters per indexed gram
        #[arg(long, env = "NGRAM_GRAM_SIZE", default_value = "3")]
        gram_size: usize,

        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Drop results scoring below this threshold
        #[arg(long)]
        min_score: Option<f64>,

        /// Print one JSON object per result
        #[arg(long)]
        json: bool,
    },

    /// Show statistics for an indexed directory
    Stats {
        /// Directory to index (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Characters per indexed gram
        #[arg(long, env = "NGRAM_GRAM_SIZE", default_value = "3")]
        gram_size: usize,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

/// JSON line emitted by `search --json`
#[derive(Serialize)]
struct JsonHit<'a> {
    path: Option<String>,
    #[serde(flatten)]
    hit: &'a SearchHit,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo { query, limit } => cmd_demo(query, limit),

        Commands::Search {
            query,
            dir,
            extensions,
            exclude,
            glob,
            max_size,
            gram_size,
            limit,
            min_score,
            json,
        } => {
            let config = scan_config(extensions, exclude, glob, max_size);
            let options = QueryOptions {
                limit: Some(limit),
                min_score,
            };
            cmd_search(dir, config, gram_size, query, options, json)
        }

        Commands::Stats {
            dir,
            gram_size,
            json,
        } => cmd_stats(dir, gram_size, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log filter from a `RUST_LOG` value, falling back to warnings only
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn scan_config(
    extensions: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    glob: Option<String>,
    max_size: u64,
) -> ScanConfig {
    let mut config = ScanConfig::default();

    if let Some(exts) = extensions {
        config.extensions = exts;
    }

    if let Some(excl) = exclude {
        config.exclude_patterns = excl;
    }

    config.include_glob = glob;
    config.max_file_size = max_size * 1024 * 1024;
    config
}

fn cmd_demo(query: String, limit: usize) -> ngram_index::Result<()> {
    let mut index = NgramIndex::new();
    index.add(1, "mazerunner");
    index.add(2, "amazing");
    index.add(3, "running");

    let options = QueryOptions {
        limit: Some(limit),
        min_score: None,
    };
    let hits = rank(index.search(&query), &options);

    println!("Query: \"{}\"", query);
    for hit in &hits {
        println!("{:.4}  {}", hit.score, hit.text);
    }

    Ok(())
}

fn cmd_search(
    dir: PathBuf,
    config: ScanConfig,
    gram_size: usize,
    query: String,
    options: QueryOptions,
    json: bool,
) -> ngram_index::Result<()> {
    let start = Instant::now();
    let corpus = scan_documents(&dir, &config)?;
    let index = corpus.index_with_config(IndexConfig { gram_size })?;
    let index_time = start.elapsed();

    info!(
        documents = corpus.len(),
        elapsed_ms = index_time.as_secs_f64() * 1000.0,
        "indexed directory"
    );

    let start = Instant::now();
    let result = search_ranked(&index.read(), &query, &options);
    let query_time = start.elapsed();

    if json {
        for hit in &result.hits {
            print_json(&corpus, hit)?;
        }
        return Ok(());
    }

    println!(
        "Query: \"{}\" ({} grams, {} matched)",
        query, result.query_gram_count, result.matched_gram_count
    );
    println!(
        "Found {} documents in {:.3}ms (index: {:.3}ms)",
        result.hits.len(),
        query_time.as_secs_f64() * 1000.0,
        index_time.as_secs_f64() * 1000.0
    );
    println!();

    for hit in &result.hits {
        let path = corpus
            .path(hit.doc_id)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("{:.4}  {}", hit.score, path);
    }

    Ok(())
}

fn print_json(corpus: &Corpus, hit: &SearchHit) -> ngram_index::Result<()> {
    let line = JsonHit {
        path: corpus.path(hit.doc_id).map(|p| p.display().to_string()),
        hit,
    };
    println!("{}", to_json(&line)?);
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> ngram_index::Result<String> {
    serde_json::to_string(value).map_err(|e| NgramError::Serialization(e.to_string()))
}

fn cmd_stats(dir: PathBuf, gram_size: usize, json: bool) -> ngram_index::Result<()> {
    let corpus = scan_documents(&dir, &ScanConfig::default())?;
    let index = corpus.index_with_config(IndexConfig { gram_size })?;
    let stats = index.stats();

    if json {
        println!("{}", to_json(&stats)?);
        return Ok(());
    }

    println!("Index Statistics");
    println!("================");
    println!("Root path:     {}", corpus.root.display());
    println!("Gram size:     {}", stats.gram_size);
    println!("Documents:     {}", stats.document_count);
    println!("Unique grams:  {}", stats.gram_count);
    println!("Postings:      {}", stats.posting_count);

    Ok(())
}
