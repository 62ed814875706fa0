use lexai::cli::handlers::{
    handle_chunk, handle_clean, handle_embed, handle_ingest, handle_init_db, handle_scrape,
    handle_search, handle_serve,
};
use lexai::cli::{CliArgs, Commands};
use lexai::config::{load_dotenv, LexaiConfig};
use lexai::util::logging::{init_logging, parse_level, LoggingConfig};
use lexai::{NAME, VERSION};

use clap::Parser;
use std::env;
use std::process;
use tracing::{debug, error, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    load_dotenv();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let config = match LexaiConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("\nPlease check your LEXAI_* environment variables.");
            process::exit(1);
        }
    };
    debug!("{}", config);

    let quiet = args.quiet;
    let exit_code = match &args.command {
        Commands::InitDb => handle_init_db(quiet).await,
        Commands::Scrape(scrape_args) => handle_scrape(scrape_args, &config, quiet).await,
        Commands::Clean(clean_args) => handle_clean(clean_args, &config, quiet),
        Commands::Chunk(chunk_args) => handle_chunk(chunk_args, &config, quiet).await,
        Commands::Embed => handle_embed(&config, quiet).await,
        Commands::Ingest(chunk_args) => handle_ingest(chunk_args, &config, quiet).await,
        Commands::Search(search_args) => handle_search(search_args, &config).await,
        Commands::Serve(serve_args) => handle_serve(serve_args, &config).await,
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("LEXAI_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("LEXAI_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let config = if use_json {
        LoggingConfig {
            level,
            ..LoggingConfig::production()
        }
    } else {
        LoggingConfig::with_level(level)
    };
    init_logging(config);
}
