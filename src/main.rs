use academic_papers_search::config::{find_config_file, get_config, load_config, Config};
use academic_papers_search::models::{FilterCriteria, FlexibleDate, PaperResult};
use academic_papers_search::query::{compile, derive_key, effective_limit};
use academic_papers_search::sources::CoreClient;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Academic Papers Search - cached, filter-based search over the CORE API
#[derive(Parser, Debug)]
#[command(name = "academic-papers-search")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search CORE for academic papers with a shared result cache", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Disable caching for this command
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    /// Show recognized environment variables and exit
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Plain text on a terminal, JSON otherwise
    Auto,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Search filters; every flag is optional
#[derive(Args, Debug, Default)]
struct Filters {
    /// Words in the abstract
    #[arg(long = "abstract")]
    abstract_text: Option<String>,

    /// Accepted date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    accepted_date: Option<String>,

    /// arXiv identifier
    #[arg(long)]
    arxiv_id: Option<String>,

    /// Comma-separated author names
    #[arg(long)]
    authors: Option<String>,

    /// Citation count
    #[arg(long)]
    citation_count: Option<u64>,

    /// Comma-separated contributor names
    #[arg(long)]
    contributors: Option<String>,

    /// Created date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    created_date: Option<String>,

    /// Document type (e.g. "research")
    #[arg(long)]
    document_type: Option<String>,

    #[arg(long)]
    doi: Option<String>,

    /// Words in the full text
    #[arg(long)]
    full_text: Option<String>,

    /// CORE work id
    #[arg(long)]
    id: Option<u64>,

    /// Microsoft Academic Graph id
    #[arg(long)]
    mag_id: Option<String>,

    #[arg(long)]
    publisher: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    year_published: Option<String>,

    /// Maximum number of results (0 = upstream default)
    #[arg(long, short, default_value_t = 0)]
    limit: u32,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers matching the given filters
    #[command(alias = "s")]
    Search {
        #[command(flatten)]
        filters: Filters,

        /// Print the response totals and bypass the cache
        #[arg(long)]
        totals: bool,
    },

    /// Show the canonical query and cache key without searching
    Explain {
        #[command(flatten)]
        filters: Filters,
    },
}

/// Parse a date filter the way the HTTP glue does: unparseable input is ignored
fn parse_date_filter(name: &str, raw: Option<&str>) -> FlexibleDate {
    match raw.map(FlexibleDate::decode) {
        Some(Ok(date)) => date,
        Some(Err(e)) => {
            tracing::warn!("Ignoring {} filter: {}", name, e);
            FlexibleDate::NONE
        }
        None => FlexibleDate::NONE,
    }
}

impl Filters {
    fn into_criteria(self) -> FilterCriteria {
        FilterCriteria {
            accepted_date: parse_date_filter("accepted date", self.accepted_date.as_deref()),
            created_date: parse_date_filter("created date", self.created_date.as_deref()),
            abstract_text: self.abstract_text.unwrap_or_default(),
            arxiv_id: self.arxiv_id.unwrap_or_default(),
            authors: self
                .authors
                .as_deref()
                .map(FilterCriteria::split_list)
                .unwrap_or_default(),
            citation_count: self.citation_count.unwrap_or_default(),
            contributors: self
                .contributors
                .as_deref()
                .map(FilterCriteria::split_list)
                .unwrap_or_default(),
            document_type: self.document_type.unwrap_or_default(),
            doi: self.doi.unwrap_or_default(),
            full_text: self.full_text.unwrap_or_default(),
            id: self.id.unwrap_or_default(),
            mag_id: self.mag_id.unwrap_or_default(),
            publisher: self.publisher.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            year_published: self.year_published.unwrap_or_default(),
            limit: self.limit,
        }
    }
}

fn print_env_vars() {
    println!("Environment Variables:");
    println!();
    println!("Legacy variables (used when no config file is found):");
    println!("  CORE_API_KEY                 CORE API key (sent as a bearer token)");
    println!("  REDIS_HOST                   Redis host (default: localhost)");
    println!("  REDIS_PORT                   Redis port (default: 6379)");
    println!("  REDIS_PASSWORD               Redis password");
    println!("  REDIS_DB                     Redis database index (default: 0)");
    println!();
    println!("Config file overrides:");
    println!("  ACADEMIC_PAPERS__API__CORE_API_KEY");
    println!("  ACADEMIC_PAPERS__API__TIMEOUT_SECONDS");
    println!("  ACADEMIC_PAPERS__CACHE__ENABLED");
    println!("  ACADEMIC_PAPERS__CACHE__HOST");
    println!("  ACADEMIC_PAPERS__CACHE__TTL_SECONDS");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                     Rust logging level (e.g., debug, info, warn, error)");
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Plain,
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    }
}

fn print_papers(papers: &[PaperResult], format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(papers)?),
        _ => {
            for (i, paper) in papers.iter().enumerate() {
                println!("{}. {}", i + 1, paper.title);
                let authors = paper.author_names();
                if !authors.is_empty() {
                    println!("   Authors:   {}", authors.join("; "));
                }
                if !paper.publisher.is_empty() {
                    println!("   Publisher: {}", paper.publisher);
                }
                if paper.published_date.is_some() {
                    println!("   Published: {}", paper.published_date.format_calendar());
                }
                if paper.has_download() {
                    println!("   PDF:       {}", paper.download_url);
                }
            }
            if papers.is_empty() {
                println!("No papers found.");
            }
        }
    }
    Ok(())
}

fn load(path: Option<&PathBuf>, timeout: Option<u64>, no_cache: bool) -> Result<Config> {
    let mut config = if let Some(path) = path {
        load_config(path)?
    } else if let Some(path) = find_config_file() {
        tracing::info!("Using config file: {}", path.display());
        load_config(&path)?
    } else {
        get_config()?
    };

    if let Some(seconds) = timeout {
        config.api.timeout_seconds = seconds;
    }
    if no_cache {
        config.cache.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("academic_papers_search={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Explain { filters }) => {
            let compiled = compile(&filters.into_criteria());
            let key = derive_key(&compiled.clauses, compiled.limit);
            println!("Query: {}", compiled.canonical);
            println!("Limit: {}", effective_limit(compiled.limit));
            println!("Key:   {}", key);
        }
        Some(Commands::Search { filters, totals }) => {
            let config = load(cli.config.as_ref(), cli.timeout, cli.no_cache)?;
            let client = CoreClient::from_config(&config).await?;
            let criteria = filters.into_criteria();

            if totals {
                let envelope = client.search_envelope(&criteria).await?;
                println!(
                    "Total hits: {} (offset {}, limit {})",
                    envelope.total_hits, envelope.offset, envelope.limit
                );
                print_papers(&envelope.results, cli.output)?;
            } else {
                let deadline =
                    tokio::time::Instant::now() + config.api.timeout() + Duration::from_secs(5);
                let papers = client.search_with_deadline(&criteria, deadline).await?;
                print_papers(&papers, cli.output)?;
            }
        }
        None => println!("No command given. Run with --help for usage."),
    }

    Ok(())
}
