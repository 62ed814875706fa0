//! lexai - semantic search over Philippine Supreme Court decisions
//!
//! The crate implements a retrieval pipeline end to end:
//!
//! 1. [`scraper`] crawls the Supreme Court e-library into a JSONL file
//! 2. [`preprocess`] strips the page chrome in front of each decision
//! 3. [`chunking`] splits decisions into sections, sentences and
//!    overlapping chunks with case metadata
//! 4. [`ingest`] stores the chunks in PostgreSQL and embeds them with
//!    BGE-M3 ([`embedding`]) into a pgvector column ([`store`])
//! 5. [`search`] answers queries by cosine distance, from the CLI or over
//!    HTTP ([`api`])
//!
//! # Example Usage
//!
//! ```ignore
//! use lexai::{HashEmbedder, MemoryStore, SearchService};
//! use std::sync::Arc;
//!
//! async fn top_hits() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = SearchService::new(Arc::new(HashEmbedder::new(1024)), Arc::new(MemoryStore::new(1024)));
//!     for hit in service.search("illegal dismissal", 5).await? {
//!         println!("{} {:.3}", hit.case_no, hit.similarity);
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod preprocess;
pub mod scraper;
pub mod search;
pub mod store;
pub mod util;

pub use chunking::{build_rag_chunks, ChunkingConfig, RagChunk};
pub use config::{ConfigError, DatabaseConfig, LexaiConfig};
pub use embedding::{BgeM3Embedder, Embedder, EmbeddingError, HashEmbedder};
pub use ingest::{chunk_and_upsert, embed_pending, Checkpoint, IngestError};
pub use scraper::{DecisionRecord, ScrapeError};
pub use search::{SearchError, SearchHit, SearchService};
pub use store::{ChunkHit, ChunkStore, MemoryStore, PgStore, StoreError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "lexai");
    }
}
