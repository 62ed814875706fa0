//! Semantic search over stored chunks

use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{ChunkHit, ChunkStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_K: usize = 5;
pub const MAX_K: usize = 100;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Query must not be empty.")]
    EmptyQuery,

    #[error("k must be between 1 and {max}, got {k}")]
    InvalidK { k: usize, max: usize },

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Embedding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A search result as returned to users
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub case_no: String,
    pub section: Option<String>,
    pub chunk_index: i32,
    pub preview: String,
    pub distance: f64,
    /// `1 - distance / 2`, in `[0, 1]`
    pub similarity: f64,
}

impl From<ChunkHit> for SearchHit {
    fn from(hit: ChunkHit) -> Self {
        Self {
            similarity: 1.0 - hit.distance / 2.0,
            id: hit.id,
            case_no: hit.case_no,
            section: hit.section,
            chunk_index: hit.chunk_index,
            preview: hit.preview,
            distance: hit.distance,
        }
    }
}

/// Query embedding plus nearest-neighbour lookup
#[derive(Clone)]
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
}

impl SearchService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ChunkStore>) -> Self {
        Self { embedder, store }
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if !(1..=MAX_K).contains(&k) {
            return Err(SearchError::InvalidK { k, max: MAX_K });
        }

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.encode_query(&text)).await??;

        let hits = self.store.search(&vector, k).await?;
        debug!(query, k, hits = hits.len(), store = self.store.name(), "Search complete");
        Ok(hits.into_iter().map(SearchHit::from).collect())
    }
}
