//! CLI for pmid-fetch - Fetch PubMed metadata into a local JSON cache.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pmid_fetch::{
    cache::CacheError, collect_pmids, config::EUTILS_BASE_URL, sync_cache, CollectError,
    Credentials, EsummaryClient, FetchOptions,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Fetch PubMed metadata for PMIDs and write a local JSON database
#[derive(Parser)]
#[command(name = "pmid-fetch")]
#[command(version)]
#[command(after_help = "\
Examples:
  pmid-fetch --md cv.md --out .cache/pubmed.json
  pmid-fetch --pmids-file pmids.txt -o .cache/pubmed.json
  pmid-fetch 31314747 40424645 -o .cache/pubmed.json

Write `PMID:########` in Markdown; records already in the output file are not fetched again.")]
struct Cli {
    /// PMIDs to fetch
    pmids: Vec<String>,

    /// Markdown file to scan for 'PMID:####'
    #[arg(long)]
    md: Option<PathBuf>,

    /// PMID list file (one PMID per line)
    #[arg(long)]
    pmids_file: Option<PathBuf>,

    /// Output JSON database
    #[arg(short, long, default_value = ".cache/pubmed.json")]
    out: PathBuf,

    /// Contact email sent to NCBI (recommended)
    #[arg(long, env = "NCBI_EMAIL")]
    email: Option<String>,

    /// NCBI API key
    #[arg(long, env = "NCBI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// E-utilities base URL
    #[arg(long, env = "PMID_FETCH_EUTILS_URL", default_value = EUTILS_BASE_URL, hide = true)]
    eutils_url: String,

    /// Pause between batches, in milliseconds
    #[arg(long, default_value_t = 340, hide = true)]
    delay_ms: u64,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 2 — no PMID found in any input
    NoIdentifiers,
    /// Exit 10 — input file not found / unreadable
    InputFile(String),
    /// Exit 11 — NCBI request failed
    Fetch(String),
    /// Exit 12 — cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::NoIdentifiers => 2,
            AppError::InputFile(_) => 10,
            AppError::Fetch(_) => 11,
            AppError::OutputFile(_) => 12,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoIdentifiers => write!(f, "{}", CollectError::NoIdentifiers),
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::Fetch(msg) => {
                write!(
                    f,
                    "{}\n  hint: nothing was written; re-run to retry, cached PMIDs are skipped",
                    msg
                )
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory is writable",
                    msg
                )
            }
        }
    }
}

impl From<CollectError> for AppError {
    fn from(e: CollectError) -> Self {
        match e {
            CollectError::NoIdentifiers => AppError::NoIdentifiers,
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Fetch(_) => AppError::Fetch(e.to_string()),
            _ => AppError::OutputFile(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        match e {
            AppError::NoIdentifiers => eprintln!("{}", e),
            _ => eprintln!("Error: {}", e),
        }
        process::exit(e.exit_code());
    }
}

/// `RUST_LOG` (default `warn`), with `-v` adding `pmid_fetch=debug` on top.
fn init_tracing(verbose: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if verbose {
        if let Ok(directive) = "pmid_fetch=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    // 1. Read the inputs
    let markdown = cli.md.as_deref().map(read_input).transpose()?;
    let pmid_list = cli.pmids_file.as_deref().map(read_input).transpose()?;

    // 2. Collect PMIDs
    let pmids = collect_pmids(markdown.as_deref(), pmid_list.as_deref(), &cli.pmids)?;
    tracing::debug!(count = pmids.len(), "collected PMIDs");

    // 3. Build the esummary client
    let options = FetchOptions {
        base_url: cli.eutils_url,
        delay: Duration::from_millis(cli.delay_ms),
        ..FetchOptions::default()
    };
    let credentials = Credentials::new(cli.email, cli.api_key);
    let client =
        EsummaryClient::new(options, credentials).map_err(|e| AppError::Fetch(e.to_string()))?;

    // 4. Fetch missing records and write the cache
    let report = sync_cache(&cli.out, &pmids, &client)?;

    println!(
        "Wrote {} ({} records; {} fetched).",
        report.path.display(),
        report.total,
        report.fetched
    );

    Ok(())
}

fn read_input(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path)
        .map_err(|e| AppError::InputFile(format!("'{}': {}", path.display(), e)))
}
