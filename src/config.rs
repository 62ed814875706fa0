//! Configuration management for lexai
//!
//! Settings come from the process environment. A `.env` file in the working
//! directory is read first (see [`load_dotenv`]), so deployments can keep
//! credentials out of the command line.
//!
//! # Environment Variables
//!
//! ## Database (required by `init-db`, `chunk`, `embed`, `ingest`, `search`, `serve`)
//! - `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_HOST` - **required**
//! - `DB_PORT` - default: 5432
//!
//! ## Pipeline
//! - `LEXAI_DATA_DIR`: directory for JSONL files, caches and checkpoints - default: "./data"
//! - `LEXAI_BASE_URL`: e-library root - default: "https://elibrary.judiciary.gov.ph"
//! - `LEXAI_REQUEST_DELAY_MS`: pause after each successful request - default: "1000"
//! - `LEXAI_REQUEST_TIMEOUT`: per-request timeout in seconds - default: "20"
//! - `LEXAI_MAX_RETRIES`: attempts per request - default: "3"
//! - `LEXAI_MAX_DECISIONS_PER_MONTH`: crawl limit per month - default: unlimited
//! - `LEXAI_MAX_TOKENS`: words per chunk - default: "350"
//! - `LEXAI_OVERLAP_SENTENCES`: sentences repeated between chunks - default: "2"
//! - `LEXAI_MODEL_CACHE_DIR`: HuggingFace cache override - default: HuggingFace's own
//! - `LEXAI_BIND`: HTTP listen address - default: "0.0.0.0:8000"
//! - `LEXAI_LOG_LEVEL`: logging level - default: "info"

use crate::chunking::ChunkingConfig;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BASE_URL: &str = "https://elibrary.judiciary.gov.ph";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1500;
const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; research-bot; +https://example.com)";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Reads the `.env` file from the working directory, if there is one.
///
/// Variables already present in the environment win over the file.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring malformed .env file: {}", e),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            field: key.to_string(),
            error: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// PostgreSQL connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            name: required(&lookup, "DB_NAME")?,
            user: required(&lookup, "DB_USER")?,
            password: required(&lookup, "DB_PASSWORD")?,
            host: required(&lookup, "DB_HOST")?,
            port: parsed(&lookup, "DB_PORT", DEFAULT_DB_PORT)?,
        })
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .dbname(&self.name)
            .user(&self.user)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .application_name("lexai");
        config
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"********")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "postgres://{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}

/// Crawler settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    /// Base pause after a failed attempt, multiplied by the attempt number
    pub retry_backoff: Duration,
    pub max_decisions_per_month: Option<usize>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            max_decisions_per_month: None,
        }
    }
}

/// Locations of the pipeline's files, all under one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Crawler output, one decision per line
    pub fn raw_jsonl(&self) -> PathBuf {
        self.data_dir.join("sc_elibrary_decisions_text_combined.jsonl")
    }

    /// Crawler output after [`crate::preprocess`]
    pub fn cleaned_jsonl(&self) -> PathBuf {
        self.data_dir
            .join("sc_elibrary_decisions_text_combined_cleaned.jsonl")
    }

    /// Last URL fully chunked into the database
    pub fn chunk_checkpoint(&self) -> PathBuf {
        self.data_dir.join("chunking_checkpoint.txt")
    }

    pub fn scrape_cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    /// URLs already fetched by the crawler, one per line
    pub fn scrape_checkpoint(&self) -> PathBuf {
        self.data_dir.join("checkpoint_done.txt")
    }
}

/// Main configuration structure for lexai
#[derive(Debug, Clone)]
pub struct LexaiConfig {
    pub paths: DataPaths,
    pub scraper: ScraperConfig,
    pub chunking: ChunkingConfig,
    pub model_cache_dir: Option<PathBuf>,
    pub bind: String,
    pub log_level: String,
}

impl Default for LexaiConfig {
    fn default() -> Self {
        Self {
            paths: DataPaths::new(DEFAULT_DATA_DIR),
            scraper: ScraperConfig::default(),
            chunking: ChunkingConfig::default(),
            model_cache_dir: None,
            bind: DEFAULT_BIND.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LexaiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scraper = ScraperConfig {
            base_url: lookup("LEXAI_BASE_URL").unwrap_or(defaults.scraper.base_url),
            user_agent: defaults.scraper.user_agent,
            request_delay: Duration::from_millis(parsed(
                &lookup,
                "LEXAI_REQUEST_DELAY_MS",
                DEFAULT_REQUEST_DELAY_MS,
            )?),
            request_timeout: Duration::from_secs(parsed(
                &lookup,
                "LEXAI_REQUEST_TIMEOUT",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_retries: parsed(&lookup, "LEXAI_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_backoff: defaults.scraper.retry_backoff,
            max_decisions_per_month: match lookup("LEXAI_MAX_DECISIONS_PER_MONTH") {
                Some(_) => Some(parsed(&lookup, "LEXAI_MAX_DECISIONS_PER_MONTH", 0usize)?),
                None => None,
            },
        };

        let chunking = ChunkingConfig {
            max_tokens: parsed(&lookup, "LEXAI_MAX_TOKENS", defaults.chunking.max_tokens)?,
            overlap_sentences: parsed(
                &lookup,
                "LEXAI_OVERLAP_SENTENCES",
                defaults.chunking.overlap_sentences,
            )?,
            ..defaults.chunking
        };

        Ok(Self {
            paths: lookup("LEXAI_DATA_DIR")
                .map(DataPaths::new)
                .unwrap_or(defaults.paths),
            scraper,
            chunking,
            model_cache_dir: lookup("LEXAI_MODEL_CACHE_DIR").map(PathBuf::from),
            bind: lookup("LEXAI_BIND").unwrap_or(defaults.bind),
            log_level: lookup("LEXAI_LOG_LEVEL")
                .unwrap_or(defaults.log_level)
                .to_lowercase(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.scraper.max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max retries must be at least 1".to_string(),
            ));
        }
        if self.chunking.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max tokens per chunk must be at least 1".to_string(),
            ));
        }
        if self.chunking.overlap_sentences >= self.chunking.max_tokens {
            return Err(ConfigError::ValidationFailed(format!(
                "Overlap ({} sentences) must be smaller than the chunk size ({} tokens)",
                self.chunking.overlap_sentences, self.chunking.max_tokens
            )));
        }
        if self.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid bind address: {}",
                self.bind
            )));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for LexaiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LexAI Configuration:")?;
        writeln!(f, "  Data Dir: {}", self.paths.data_dir().display())?;
        writeln!(f, "  Base URL: {}", self.scraper.base_url)?;
        writeln!(
            f,
            "  Request Delay: {}ms",
            self.scraper.request_delay.as_millis()
        )?;
        writeln!(
            f,
            "  Request Timeout: {}s",
            self.scraper.request_timeout.as_secs()
        )?;
        writeln!(f, "  Max Retries: {}", self.scraper.max_retries)?;
        writeln!(
            f,
            "  Chunking: {} tokens, {} overlap sentences",
            self.chunking.max_tokens, self.chunking.overlap_sentences
        )?;
        if let Some(ref dir) = self.model_cache_dir {
            writeln!(f, "  Model Cache Dir: {}", dir.display())?;
        }
        writeln!(f, "  Bind: {}", self.bind)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
