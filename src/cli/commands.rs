use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Semantic search over Philippine Supreme Court decisions
#[derive(Parser, Debug)]
#[command(
    name = "lexai",
    about = "Semantic search over Philippine Supreme Court decisions",
    version,
    author,
    long_about = "lexai crawls the Supreme Court e-library, cleans and chunks the decisions, \
                  embeds the chunks with BGE-M3 into PostgreSQL/pgvector, and answers \
                  natural-language queries from the command line or over HTTP.\n\n\
                  Database settings come from DB_NAME, DB_USER, DB_PASSWORD, DB_HOST and \
                  DB_PORT (a .env file is read if present)."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Verbose (debug) logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Create the pgvector extension, tables, indexes and triggers")]
    InitDb,

    #[command(
        about = "Crawl the e-library into a JSONL file",
        long_about = "Walks the e-library index, every month page and every decision page, \
                      writing one JSON object per decision. Fetched pages are cached under \
                      the data directory so an interrupted crawl resumes cheaply.\n\n\
                      Examples:\n  \
                      lexai scrape\n  \
                      lexai scrape --max-per-month 5 --output data/sample.jsonl"
    )]
    Scrape(ScrapeArgs),

    #[command(about = "Strip page chrome before the division heading of each decision")]
    Clean(CleanArgs),

    #[command(about = "Chunk cleaned decisions and insert the chunks (resumable)")]
    Chunk(ChunkArgs),

    #[command(about = "Embed every stored chunk that has no embedding yet")]
    Embed,

    #[command(about = "Run chunk, then embed")]
    Ingest(ChunkArgs),

    #[command(
        about = "Search stored chunks",
        long_about = "Embeds the query and prints the nearest chunks.\n\n\
                      Examples:\n  \
                      lexai search \"Ano ang final ruling sa petition?\"\n  \
                      lexai search \"illegal dismissal\" -k 10 --format json"
    )]
    Search(SearchArgs),

    #[command(about = "Serve the HTTP search API")]
    Serve(ServeArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScrapeArgs {
    #[arg(long, value_name = "N", help = "Fetch at most N decisions per month")]
    pub max_per_month: Option<usize>,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output JSONL (defaults to the raw file in the data directory)"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CleanArgs {
    #[arg(short = 'i', long, value_name = "FILE", help = "Raw JSONL to clean")]
    pub input: Option<PathBuf>,

    #[arg(short = 'o', long, value_name = "FILE", help = "Where to write the cleaned JSONL")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ChunkArgs {
    #[arg(short = 'i', long, value_name = "FILE", help = "Cleaned JSONL to ingest")]
    pub input: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", help = "Natural-language query")]
    pub query: String,

    #[arg(short = 'k', long, default_value = "5", help = "Number of results (1-100)")]
    pub k: usize,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR", help = "Address to bind (defaults to LEXAI_BIND or 0.0.0.0:8000)")]
    pub bind: Option<SocketAddr>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}
